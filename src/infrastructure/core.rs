mod reservation;
mod room;

pub use self::reservation::*;
pub use self::room::*;
