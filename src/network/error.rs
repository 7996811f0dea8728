use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    #[error("node {0} already exists in the network")]
    DuplicateNode(String),

    #[error("link {0} already exists in the network")]
    DuplicateLink(String),

    #[error("link {link} references unknown node {node}")]
    UnknownNode { link: String, node: String },

    #[error("link {link} has a non-positive freespeed of {freespeed}")]
    InvalidFreespeed { link: String, freespeed: f64 },

    #[error("network exceeds the addressable number of elements")]
    Overflow,
}
