pub mod book_tree;
pub mod text_reader;
