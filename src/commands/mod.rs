pub mod reroot;

pub mod command_io {
    use rerooter::io::parser::newick_importer::NewickImporter;
    use rerooter::io::writer::newick_writer::write_newick;
    use rerooter::io::InternalLabels;
    use rerooter::tree::mutable_tree::MutableTree;
    use std::fs::File;
    use std::io::{self, BufWriter, Write};
    use std::path;

    /// Opens the input file, or stdin when no file is given.
    pub fn tree_input(
        input: Option<&path::Path>,
        internal_labels: InternalLabels,
    ) -> io::Result<NewickImporter> {
        match input {
            Some(path) => {
                debug!("reading trees from {}", path.display());
                NewickImporter::from_path(path, internal_labels)
            }
            None => {
                debug!("reading trees from stdin");
                NewickImporter::from_console(internal_labels)
            }
        }
    }

    /// Writes the tree to `output`, replacing any existing file.
    pub fn write_tree(
        output: &path::Path,
        tree: &MutableTree,
        internal_labels: InternalLabels,
    ) -> io::Result<()> {
        let file = File::create(output)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", write_newick(tree, internal_labels))?;
        writer.flush()
    }
}
