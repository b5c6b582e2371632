use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("cannot settle a composition from inside a composition pass")]
    Reentrant,
    #[error("composition did not settle after {passes} passes")]
    Unsettled { passes: usize },
    #[error("no button labelled '{0}' in the composed view")]
    NoSuchTarget(String),
    #[error("nothing has been composed yet")]
    NothingComposed,
}
