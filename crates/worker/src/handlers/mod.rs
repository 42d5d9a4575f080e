pub mod multiply;
