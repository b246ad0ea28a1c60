use super::newick_parser::NewickParser;
use super::tree_importer::TreeImporter;
use crate::io::error::IoError;
use crate::io::InternalLabels;
use crate::tree::mutable_tree::MutableTree;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

/// Reads `;` separated newick trees from a file or stdin, one at a time.
pub struct NewickImporter {
    source: String,
    position: usize,
    internal_labels: InternalLabels,
}

impl NewickImporter {
    /// Reads the whole source. Bytes that are not UTF-8 give an `InvalidData`
    /// error wrapping an `IoError::Format`.
    pub fn from_reader<R: Read>(mut reader: R, internal_labels: InternalLabels) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let source = String::from_utf8(bytes).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                IoError::Format(format!("input is not valid UTF-8: {}", e)),
            )
        })?;
        Ok(NewickImporter::from_string(source, internal_labels))
    }
    pub fn from_string(source: String, internal_labels: InternalLabels) -> Self {
        NewickImporter {
            source,
            position: 0,
            internal_labels,
        }
    }
    pub fn from_console(internal_labels: InternalLabels) -> io::Result<Self> {
        let stdin = io::stdin();
        let handle = stdin.lock();
        NewickImporter::from_reader(handle, internal_labels)
    }
    pub fn from_path(path: &Path, internal_labels: InternalLabels) -> io::Result<Self> {
        File::open(path).and_then(|file| NewickImporter::from_reader(file, internal_labels))
    }
}

impl TreeImporter for NewickImporter {
    fn has_tree(&mut self) -> bool {
        !self.source[self.position..].trim().is_empty()
    }

    fn read_next_tree(&mut self) -> Result<MutableTree, IoError> {
        let mut parser = NewickParser::new(&self.source[self.position..], self.internal_labels);
        let tree = parser.read_tree();
        // skip the rest of the source on error so iteration ends
        self.position = match tree {
            Ok(_) => self.position + parser.consumed(),
            Err(_) => self.source.len(),
        };
        tree
    }
}

impl Iterator for NewickImporter {
    type Item = Result<MutableTree, IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_tree() {
            Some(self.read_next_tree())
        } else {
            None
        }
    }
}
