pub mod admission_request;
pub mod admission_response;
pub mod envelope;
pub mod errors;
pub mod mutating;
pub mod patch;
pub mod resource;
pub mod validating;
pub mod verdict;
