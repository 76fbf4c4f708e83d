pub mod db;

pub use db::ReviewStore;
