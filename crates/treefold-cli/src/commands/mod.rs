pub mod fold_tree;
pub mod sample;
