pub mod adjacent;
pub mod comment;
pub mod hook;

pub use adjacent::AdjacentStrategy;
pub use comment::CommentStrategy;
pub use hook::HookStrategy;
