use serde::{Deserialize, Serialize};

/// Address of a paragraph: index of its top-level section and its position
/// among that section's non-blank paragraphs (subsections included).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub section: usize,
    pub paragraph: usize,
}

impl Location {
    pub fn new(section: usize, paragraph: usize) -> Self {
        Self { section, paragraph }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(alias = "section_title", default)]
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub subsections: Vec<Section>,
}

impl Section {
    pub fn new(title: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content,
            subsections: Vec::new(),
        }
    }

    pub fn with_subsection(mut self, subsection: Section) -> Self {
        self.subsections.push(subsection);
        self
    }

    /// Walk own content first, then each subsection depth-first.
    fn collect<'a>(&'a self, lineage: &mut Vec<&'a str>, out: &mut Vec<(Vec<String>, &'a str)>) {
        lineage.push(&self.title);
        for para in &self.content {
            let trimmed = para.trim();
            if !trimmed.is_empty() {
                out.push((lineage.iter().map(|s| s.to_string()).collect(), trimmed));
            }
        }
        for sub in &self.subsections {
            sub.collect(lineage, out);
        }
        lineage.pop();
    }
}

/// A paragraph with its stable location and section lineage (root title first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub location: Location,
    pub section_path: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new(title: impl Into<String>, category: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            sections,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Non-blank paragraphs of one top-level section, in reading order.
    pub fn section_paragraphs(&self, section_index: usize) -> Vec<Paragraph> {
        let Some(section) = self.sections.get(section_index) else {
            return Vec::new();
        };

        let mut raw = Vec::new();
        section.collect(&mut Vec::new(), &mut raw);

        raw.into_iter()
            .enumerate()
            .map(|(idx, (section_path, text))| Paragraph {
                location: Location::new(section_index, idx),
                section_path,
                text: text.to_string(),
            })
            .collect()
    }

    /// Every non-blank paragraph in the document, ordered by location.
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        (0..self.sections.len())
            .flat_map(|idx| self.section_paragraphs(idx))
            .collect()
    }

    pub fn paragraph(&self, location: Location) -> Option<Paragraph> {
        self.section_paragraphs(location.section)
            .into_iter()
            .nth(location.paragraph)
    }

    /// All paragraph text joined by single spaces.
    pub fn full_text(&self) -> String {
        self.paragraphs()
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs().is_empty()
    }
}
