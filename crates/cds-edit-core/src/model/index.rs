//! Index of target definitions

use std::collections::HashSet;

use super::AnnotationFile;
use crate::text::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub name: String,
    pub range: Range,
}

/// Source ranges of all targets present in a file, sorted by position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetIndex {
    entries: Vec<TargetEntry>,
}

impl TargetIndex {
    pub fn build(file: &AnnotationFile) -> Self {
        let mut entries: Vec<TargetEntry> = file
            .targets
            .iter()
            .filter_map(|target| {
                target.range.map(|range| TargetEntry {
                    name: target.name.clone(),
                    range,
                })
            })
            .collect();
        entries.sort_by_key(|entry| entry.range.start);
        Self { entries }
    }

    pub fn entries(&self) -> &[TargetEntry] {
        &self.entries
    }

    /// Targets located inside `statement`
    pub fn within(&self, statement: Range) -> impl Iterator<Item = &TargetEntry> {
        let start = self
            .entries
            .partition_point(|entry| entry.range.start < statement.start);
        self.entries[start..]
            .iter()
            .take_while(move |entry| entry.range.start < statement.end)
            .filter(move |entry| statement.contains(&entry.range))
    }

    /// Check if a statement still holds a target that is not being deleted
    pub fn has_survivor_within(&self, statement: Range, deleted: &HashSet<String>) -> bool {
        self.within(statement)
            .any(|entry| !deleted.contains(&entry.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Target;

    fn index() -> TargetIndex {
        let mut file = AnnotationFile::default();
        for (name, range) in [
            ("Books/title", Range::from_coords(1, 4, 1, 30)),
            ("Books", Range::from_coords(0, 0, 0, 30)),
            ("Books/author", Range::from_coords(2, 4, 2, 30)),
            ("Authors", Range::from_coords(5, 0, 5, 30)),
        ] {
            let mut target = Target::new(name);
            target.range = Some(range);
            file.targets.push(target);
        }
        file.targets.push(Target::new("Synthesized"));
        TargetIndex::build(&file)
    }

    #[test]
    fn test_entries_are_sorted_and_synthesized_skipped() {
        let index = index();
        let names: Vec<&str> = index.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Books", "Books/title", "Books/author", "Authors"]);
    }

    #[test]
    fn test_survivors_within_statement() {
        let index = index();
        let statement = Range::from_coords(0, 0, 3, 2);
        let mut deleted: HashSet<String> = ["Books/title".to_string()].into();
        assert!(index.has_survivor_within(statement, &deleted));
        deleted.insert("Books/author".into());
        deleted.insert("Books".into());
        assert!(!index.has_survivor_within(statement, &deleted));
    }
}
