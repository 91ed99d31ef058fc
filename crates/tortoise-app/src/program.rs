//! The page program.

use tortoise_core::TurtleOps;

/// A full circle of radius 100, then a step forward.
pub fn page_program<T: TurtleOps + ?Sized>(turtle: &mut T) {
    turtle.arc(100.0, 360.0);
    turtle.forward(100.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tortoise_core::Turtle;

    #[test]
    fn test_page_program_pose() {
        let mut turtle = Turtle::new();
        page_program(&mut turtle);
        assert!((turtle.position().x - 100.0).abs() < 1e-9);
        assert!(turtle.position().y.abs() < 1e-9);
        assert_eq!(turtle.heading(), 360.0);
    }
}
