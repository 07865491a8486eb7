use blockar_format::{CreateError, ExtractError};
use miette::Diagnostic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Cannot create archive")]
    #[diagnostic(help("Every named path must be a readable regular file"))]
    Create {
        #[source]
        source: CreateError,
    },

    #[error("Refusing to write archive data to a terminal")]
    #[diagnostic(help("Redirect standard output to a file or another command"))]
    TerminalOutput,

    #[error("Cannot extract archive")]
    #[diagnostic(help("Is standard input a complete blockar archive?"))]
    Extract {
        #[source]
        source: ExtractError,
    },

    #[error("Cannot list archive")]
    #[diagnostic(help("Is standard input a complete blockar archive?"))]
    List {
        #[source]
        source: ExtractError,
    },

    #[error("Cannot determine current directory")]
    #[diagnostic(help("Use -C to choose an output directory"))]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write to standard output")]
    Output {
        #[source]
        source: std::io::Error,
    },
}
