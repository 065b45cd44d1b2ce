//! Integrator detection.

use crate::domain::ClassifiedStudent;

/// Flag students whose top two scores are within `threshold` of each other.
///
/// Sets `is_integrator` on every student and returns the integrators' indices in
/// input order. The balancer later uses them as flexible filler.
pub fn detect_integrators(students: &mut [ClassifiedStudent], threshold: f64) -> Vec<usize> {
    let mut integrators = Vec::new();
    for (idx, student) in students.iter_mut().enumerate() {
        student.is_integrator = student.delta <= threshold;
        if student.is_integrator {
            integrators.push(idx);
        }
    }
    integrators
}
