pub mod root;
pub mod solver;
