pub mod assign;
pub mod corpus;
pub mod delete;
pub mod export;
pub mod init;
pub mod status;
