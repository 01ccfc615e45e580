//! Numbering of chapters and sections.
//!
//! Sections are numbered in two passes: first, a plain tree of [`Section`]s is
//! built. Then, [`number_sections`] walks the tree top-down and hands out the
//! numbers, so that each [`NumberedSection`] knows the numbers of all of its
//! ancestors.

/// A chapter or section of a document, before numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    title: String,
    number_depth: usize,
    children: Vec<Section>,
}

impl Section {
    /// Create a new section. `number_depth` is the number of section numbers
    /// shown in front of the title.
    pub fn new(title: impl Into<String>, number_depth: usize) -> Self {
        Self {
            title: title.into(),
            number_depth,
            children: vec![],
        }
    }

    /// Add a subsection.
    pub fn push(&mut self, child: Section) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Add a subsection, builder style.
    pub fn with_child(mut self, child: Section) -> Self {
        self.children.push(child);
        self
    }

    /// The title, without numbers.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The subsections.
    pub fn children(&self) -> &[Section] {
        &self.children
    }
}

/// A section with its numbers assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedSection {
    title: String,
    number_depth: usize,
    // Outermost first.
    numbers: Vec<u32>,
    children: Vec<NumberedSection>,
}

impl NumberedSection {
    fn new(section: &Section, number: u32, parent: &[u32]) -> Self {
        let mut numbers = parent.to_vec();
        numbers.push(number);

        let children = number_children(&section.children, &numbers);

        Self {
            title: section.title.clone(),
            number_depth: section.number_depth,
            numbers,
            children,
        }
    }

    /// The numbers of this section, starting with the number of the chapter.
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    /// The nesting depth. Chapters have a depth of 1.
    pub fn depth(&self) -> usize {
        self.numbers.len()
    }

    /// The numbered subsections.
    pub fn children(&self) -> &[NumberedSection] {
        &self.children
    }

    /// The title, preceded by at most `number_depth` of the innermost section
    /// numbers, e.g. `1.3. Title`.
    pub fn title(&self) -> String {
        let depth = self.number_depth.min(self.numbers.len());
        if depth == 0 {
            return self.title.clone();
        }

        let mut buf = String::new();
        for number in &self.numbers[self.numbers.len() - depth..] {
            buf.push_str(&number.to_string());
            buf.push('.');
        }

        buf.push(' ');
        buf.push_str(&self.title);
        buf
    }
}

/// Number a list of chapters, starting at 1.
pub fn number_sections(chapters: &[Section]) -> Vec<NumberedSection> {
    number_children(chapters, &[])
}

fn number_children(sections: &[Section], parent: &[u32]) -> Vec<NumberedSection> {
    sections
        .iter()
        .zip(1..)
        .map(|(section, number)| NumberedSection::new(section, number, parent))
        .collect()
}
