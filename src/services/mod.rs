pub mod canvas;
pub mod cursor;
pub mod roster;
pub mod stroke;
