// Domain layer - Readings, projection and the drawing description
pub mod drawing;
pub mod projection;
pub mod reading;
