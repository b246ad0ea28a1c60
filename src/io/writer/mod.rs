pub mod newick_writer;
