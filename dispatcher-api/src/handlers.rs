pub mod conversations;
pub mod dispatcher;
