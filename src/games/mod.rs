pub mod mines;
