//! Built-in content templates
//!
//! Each template pairs a prompt pattern with the form fields that fill it and
//! the kind of output its provider produces. The catalog is fixed at compile
//! time and never mutated.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Text,
    Image,
    Audio,
}

impl OutputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Text => "text",
            OutputKind::Image => "image",
            OutputKind::Audio => "audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub placeholder: Option<&'static str>,
    /// Fixed option set, only populated for `Select` fields
    pub options: &'static [&'static str],
    pub required: bool,
}

impl FormField {
    /// First option of a select field, used to seed new forms.
    pub fn default_option(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::Select => self.options.first().copied(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub output: OutputKind,
    /// Prompt with `${field}` placeholders
    pub prompt_pattern: &'static str,
    pub fields: &'static [FormField],
}

impl Template {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_media(&self) -> bool {
        self.output != OutputKind::Text
    }

    fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
    }
}

const fn text(name: &'static str, label: &'static str, placeholder: &'static str, required: bool) -> FormField {
    FormField { name, label, kind: FieldKind::Text, placeholder: Some(placeholder), options: &[], required }
}

const fn textarea(name: &'static str, label: &'static str, placeholder: &'static str) -> FormField {
    FormField { name, label, kind: FieldKind::Textarea, placeholder: Some(placeholder), options: &[], required: true }
}

const fn select(name: &'static str, label: &'static str, options: &'static [&'static str]) -> FormField {
    FormField { name, label, kind: FieldKind::Select, placeholder: None, options, required: true }
}

pub const ASPECT_RATIO_OPTIONS: &[&str] = &[
    "1:1 (Square)",
    "16:9 (Landscape)",
    "9:16 (Portrait)",
    "4:3 (Standard)",
    "3:4 (Vertical)",
];

pub const VOICE_OPTIONS: &[&str] = &[
    "Rachel (American, Calm)",
    "Domi (American, Strong)",
    "Bella (American, Soft)",
    "Antoni (American, Well-rounded)",
    "Josh (American, Deep)",
];

static TEMPLATES: &[Template] = &[
    Template {
        id: "blog-post",
        name: "Blog Post Writer",
        description: "Generate SEO-optimized blog posts with proper structure.",
        icon: "PenTool",
        color: "blue",
        output: OutputKind::Text,
        prompt_pattern: "Write a comprehensive and engaging blog post about \"${topic}\". \n\nTone: ${tone}.\nTarget Audience: ${audience}.\n\nThe blog post should include a catchy title, an introduction, several subheadings covering key points, and a conclusion. Ensure the content is SEO-friendly.",
        fields: &[
            text("topic", "Blog Topic", "e.g., The Future of AI in Healthcare", true),
            text("audience", "Target Audience", "e.g., Tech enthusiasts, Doctors", true),
            select("tone", "Tone of Voice", &["Professional", "Casual", "Humorous", "Authoritative", "Inspirational"]),
        ],
    },
    Template {
        id: "social-media",
        name: "Social Media Post",
        description: "Create engaging captions for Instagram, Twitter, or LinkedIn.",
        icon: "Hash",
        color: "pink",
        output: OutputKind::Text,
        prompt_pattern: "Write 3 variations of a social media post for ${platform} about \"${content}\".\n\nTone: ${tone}.\n\nInclude relevant hashtags and emojis. Keep it engaging and suitable for the platform.",
        fields: &[
            select("platform", "Platform", &["Instagram", "Twitter / X", "LinkedIn", "Facebook"]),
            textarea("content", "What is your post about?", "Describe the image or the update you want to share..."),
            select("tone", "Tone", &["Excited", "Professional", "Witty", "Minimalist"]),
        ],
    },
    Template {
        id: "youtube-script",
        name: "YouTube Video Script",
        description: "Generate a structured script for your next video.",
        icon: "Video",
        color: "red",
        output: OutputKind::Text,
        prompt_pattern: "Create a YouTube video script for a video titled \"${title}\".\n\nVideo Description: ${description}.\n\nStructure the response with: \n1. Hook (0-30s)\n2. Intro\n3. Main Content Points\n4. Call to Action\n5. Outro.",
        fields: &[
            text("title", "Video Title", "e.g., How to learn coding in 2024", true),
            textarea("description", "Video Description/Key Points", "Briefly explain what the video covers."),
        ],
    },
    Template {
        id: "email-writer",
        name: "Cold Email Generator",
        description: "Write professional cold emails that get responses.",
        icon: "Mail",
        color: "amber",
        output: OutputKind::Text,
        prompt_pattern: "Write a cold email to \"${recipient}\" proposing \"${proposition}\".\n\nGoal: ${goal}.\n\nKeep it concise, professional, and persuasive. Create a compelling subject line.",
        fields: &[
            text("recipient", "Recipient Role/Industry", "e.g., Marketing Manager at a SaaS startup", true),
            textarea("proposition", "What are you offering?", "e.g., Our new AI SEO tool"),
            select("goal", "Goal of the email", &["Schedule a demo", "Get a reply", "Partnership inquiry"]),
        ],
    },
    Template {
        id: "product-desc",
        name: "Product Description",
        description: "Compelling product descriptions for e-commerce.",
        icon: "ShoppingBag",
        color: "green",
        output: OutputKind::Text,
        prompt_pattern: "Write a persuasive product description for \"${productName}\".\n\nFeatures: ${features}.\n\nTarget Audience: ${audience}.\n\nFocus on benefits, not just features.",
        fields: &[
            text("productName", "Product Name", "e.g., ErgoChair Pro", true),
            textarea("features", "Key Features", "List the main specs and features..."),
            text("audience", "Target Audience", "e.g., Office workers", false),
        ],
    },
    Template {
        id: "rewrite",
        name: "Content Rewriter",
        description: "Rewrite existing content to improve clarity or change tone.",
        icon: "RefreshCw",
        color: "purple",
        output: OutputKind::Text,
        prompt_pattern: "Rewrite the following text to make it ${style}.\n\nOriginal Text:\n\"${originalText}\"\n\nMaintain the original meaning but improve flow and vocabulary.",
        fields: &[
            textarea("originalText", "Content to Rewrite", "Paste your text here..."),
            select("style", "New Style", &["Simpler", "More Professional", "More Engaging", "Shorter (Summarize)", "Longer (Expand)"]),
        ],
    },
    Template {
        id: "image-gen",
        name: "AI Image Generator",
        description: "Turn text into stunning visual art.",
        icon: "Image",
        color: "pink",
        output: OutputKind::Image,
        prompt_pattern: "${prompt}",
        fields: &[
            textarea("prompt", "Image Prompt", "A futuristic city with flying cars, neon lights, 4k render..."),
            select("style", "Art Style", &["Photorealistic", "Anime", "Cyberpunk", "Oil Painting", "3D Render", "Minimalist"]),
            select("aspectRatio", "Aspect Ratio", ASPECT_RATIO_OPTIONS),
            text("textOverlay", "Text Overlay (Optional)", "Text to appear on the image (e.g., \"Summer Sale\")", false),
        ],
    },
    Template {
        id: "voice-gen",
        name: "AI Voice Generator",
        description: "Turn text into lifelike speech using ElevenLabs.",
        icon: "Volume2",
        color: "orange",
        output: OutputKind::Audio,
        prompt_pattern: "${text}",
        fields: &[
            textarea("text", "Text to Speak", "Enter the text you want to convert to speech..."),
            select("voiceId", "Voice", VOICE_OPTIONS),
        ],
    },
];

/// Read-only view over the template list
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    templates: &'static [Template],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        Self { templates: TEMPLATES }
    }

    pub fn all(&self) -> &'static [Template] {
        self.templates
    }

    pub fn find(&self, id: &str) -> Option<&'static Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Templates whose name or description contains `query`, ignoring case.
    /// An empty query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&'static Template> {
        let query_lower = query.to_lowercase();
        self.templates
            .iter()
            .filter(|t| t.matches(&query_lower))
            .collect()
    }

    /// Like [`Catalog::filter`], but a blank query means no search was made
    /// and yields `None`, so "nothing matched" stays distinguishable.
    pub fn search(&self, query: &str) -> Option<Vec<&'static Template>> {
        if query.trim().is_empty() {
            return None;
        }
        Some(self.filter(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::placeholders;

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = Catalog::builtin();
        let mut ids: Vec<_> = catalog.all().iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.all().len());
    }

    #[test]
    fn test_find_by_id() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.find("image-gen").map(|t| t.output), Some(OutputKind::Image));
        assert_eq!(catalog.find("voice-gen").map(|t| t.output), Some(OutputKind::Audio));
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_filter_is_case_insensitive_over_name_and_description() {
        let catalog = Catalog::builtin();

        let by_name: Vec<_> = catalog.filter("BLOG").iter().map(|t| t.id).collect();
        assert_eq!(by_name, vec!["blog-post"]);

        let by_description: Vec<_> = catalog.filter("e-commerce").iter().map(|t| t.id).collect();
        assert_eq!(by_description, vec!["product-desc"]);
    }

    #[test]
    fn test_filter_returns_exactly_the_matching_templates() {
        let catalog = Catalog::builtin();
        let query = "generat";
        let expected: Vec<_> = catalog
            .all()
            .iter()
            .filter(|t| {
                t.name.to_lowercase().contains(query) || t.description.to_lowercase().contains(query)
            })
            .map(|t| t.id)
            .collect();
        let actual: Vec<_> = catalog.filter(query).iter().map(|t| t.id).collect();
        assert_eq!(actual, expected);
        assert!(!actual.is_empty());
    }

    #[test]
    fn test_search_distinguishes_no_search_from_no_match() {
        let catalog = Catalog::builtin();
        assert!(catalog.search("   ").is_none());
        assert_eq!(catalog.search("zzz-no-such-template").map(|v| v.len()), Some(0));
        assert_eq!(catalog.filter("").len(), catalog.all().len());
    }

    #[test]
    fn test_every_placeholder_names_a_field() {
        for template in Catalog::builtin().all() {
            for name in placeholders(template.prompt_pattern) {
                assert!(
                    template.field(&name).is_some(),
                    "{} references unknown field {}",
                    template.id,
                    name
                );
            }
        }
    }

    #[test]
    fn test_select_fields_have_defaults() {
        for template in Catalog::builtin().all() {
            for field in template.fields.iter().filter(|f| f.kind == FieldKind::Select) {
                assert!(field.default_option().is_some());
            }
        }
    }
}
