use super::command_io;
use crate::Common;
use rerooter::io::error::IoError;
use rerooter::io::parser::tree_importer::TreeImporter;
use rerooter::io::InternalLabels;
use rerooter::tree::mutable_tree::{MutableTree, TreeError};
use std::error::Error;
use std::{fmt, io, path};

#[derive(Debug)]
pub enum RerootError {
    Io(io::Error),
    Parse(IoError),
    Tree(TreeError),
    OutgroupNotFound(String),
}

impl RerootError {
    /// A missing outgroup is reported but does not fail the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RerootError::OutgroupNotFound(_))
    }
    pub fn exit_code(&self) -> exitcode::ExitCode {
        match self {
            RerootError::Io(_) => exitcode::IOERR,
            RerootError::Parse(_) | RerootError::Tree(_) => exitcode::DATAERR,
            RerootError::OutgroupNotFound(_) => exitcode::OK,
        }
    }
}

impl Error for RerootError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RerootError::Io(e) => Some(e),
            RerootError::Parse(e) => Some(e),
            RerootError::Tree(e) => Some(e),
            RerootError::OutgroupNotFound(_) => None,
        }
    }
}
impl fmt::Display for RerootError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RerootError::Io(e) => write!(f, "{}", e),
            RerootError::Parse(e) => write!(f, "{}", e),
            RerootError::Tree(e) => write!(f, "{}", e),
            RerootError::OutgroupNotFound(name) => {
                write!(f, "Outgroup {} not found in the tree.", name)
            }
        }
    }
}

impl From<io::Error> for RerootError {
    fn from(e: io::Error) -> Self {
        // input that could not be decoded carries the parse error inside
        match e.get_ref().and_then(|inner| inner.downcast_ref::<IoError>()) {
            Some(parse) => RerootError::Parse(parse.clone()),
            None => RerootError::Io(e),
        }
    }
}
impl From<IoError> for RerootError {
    fn from(e: IoError) -> Self {
        RerootError::Parse(e)
    }
}
impl From<TreeError> for RerootError {
    fn from(e: TreeError) -> Self {
        RerootError::Tree(e)
    }
}

/// A tree that was rerooted and saved. Displays as the status line of a run.
#[derive(Debug, PartialEq)]
pub struct Rerooted {
    pub output: path::PathBuf,
}

impl fmt::Display for Rerooted {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Rooted tree saved as '{}'", self.output.display())
    }
}

/// The line printed at the end of a run, where it goes, and the exit code.
#[derive(Debug)]
pub struct Report {
    pub message: String,
    pub to_stderr: bool,
    pub exit_code: exitcode::ExitCode,
}

pub fn report(result: &Result<Rerooted, RerootError>) -> Report {
    match result {
        Ok(rerooted) => Report {
            message: rerooted.to_string(),
            to_stderr: false,
            exit_code: exitcode::OK,
        },
        Err(e) if !e.is_fatal() => Report {
            message: e.to_string(),
            to_stderr: false,
            exit_code: e.exit_code(),
        },
        Err(e) => Report {
            message: format!("Error: {}", e),
            to_stderr: true,
            exit_code: e.exit_code(),
        },
    }
}

pub fn run(
    common: &Common,
    outgroup: &str,
    internal_labels: InternalLabels,
) -> Result<Rerooted, RerootError> {
    match common.infile.as_deref() {
        Some(input) => reroot(input, outgroup, &common.outfile, internal_labels),
        None => {
            let trees = command_io::tree_input(None, internal_labels)?;
            reroot_first_tree(trees, outgroup, &common.outfile, internal_labels)
        }
    }
}

/// Reroots the tree in `input` on the first node named `outgroup` and writes it to
/// `output`. Nothing is written when the outgroup is missing.
pub fn reroot(
    input: &path::Path,
    outgroup: &str,
    output: &path::Path,
    internal_labels: InternalLabels,
) -> Result<Rerooted, RerootError> {
    let trees = command_io::tree_input(Some(input), internal_labels)?;
    reroot_first_tree(trees, outgroup, output, internal_labels)
}

fn reroot_first_tree<T: TreeImporter>(
    mut trees: T,
    outgroup: &str,
    output: &path::Path,
    internal_labels: InternalLabels,
) -> Result<Rerooted, RerootError> {
    if !trees.has_tree() {
        return Err(RerootError::Parse(IoError::Eof));
    }
    let mut tree = trees.read_next_tree()?;
    info!(
        "read tree with {} tips and {} internal nodes",
        tree.get_external_node_count(),
        tree.get_internal_node_count()
    );
    if trees.has_tree() {
        warn!("input holds more than one tree, only the first is rerooted");
    }

    reroot_tree(&mut tree, outgroup)?;
    command_io::write_tree(output, &tree, internal_labels)?;
    info!("wrote rerooted tree to {}", output.display());
    Ok(Rerooted {
        output: output.to_path_buf(),
    })
}

pub fn reroot_tree(tree: &mut MutableTree, outgroup: &str) -> Result<(), RerootError> {
    let node = tree
        .find_node_by_name(outgroup)
        .ok_or_else(|| RerootError::OutgroupNotFound(outgroup.to_string()))?;
    debug!("rerooting on node {}", node);
    tree.reroot_on_outgroup(node)?;
    Ok(())
}
