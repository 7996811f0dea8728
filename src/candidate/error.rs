use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CandidateError {
    #[error("stop facility {facility} of route {route} has no coordinate")]
    MissingCoordinate { facility: String, route: String },

    #[error("link {link} was found from differing nodes {previous} and {current} by consecutive stops")]
    SeparationMismatch {
        link: String,
        previous: String,
        current: String,
    },
}
