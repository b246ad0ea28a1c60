pub mod annotation_parser;
pub mod newick_importer;
pub mod newick_parser;
pub mod tree_importer;
