mod filmsage;

pub use filmsage::*;
