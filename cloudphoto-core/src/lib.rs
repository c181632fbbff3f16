pub mod args;
pub mod command;
pub mod config;
pub mod parser;
pub mod provision;
pub mod query;
pub mod s3;
pub mod session;
pub mod store;
pub mod transfer;

pub use args::{Argument, CommandType};
pub use command::Command;
pub use config::Config;
pub use parser::ParseError;
pub use provision::{ProvisionError, ProvisionReport, Provisioner};
pub use query::{AlbumQuery, TagIndex};
pub use s3::S3Store;
pub use session::AwsSession;
pub use store::{BucketAdmin, FunctionAdmin, IdentityAdmin, ObjectStore, RemoteObject, Tag};
pub use transfer::{TransferEngine, TransferError, TransferReport};
