//! Extension points for the serializer and deserializer.
//!
//! Components run after the built-in field handling for every reflection
//! they declare support for. Higher priorities run first; equal priorities
//! run in registration order.

use crate::ids::ReflectionId;
use crate::project::Project;
use crate::reflection::Reflection;

use super::deserializer::ReviveContext;
use super::schema::JsonReflection;

/// Adds fields to serialized reflections.
pub trait SerializerComponent {
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this component handles `reflection`.
    fn supports(&self, reflection: &Reflection) -> bool;

    /// Write extra fields for `reflection` into `object`.
    fn to_object(&self, reflection: &Reflection, project: &Project, object: &mut JsonReflection);
}

/// Reads fields of serialized reflections back into the live graph.
pub trait DeserializerComponent {
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this component handles `reflection`, revived from `object`.
    fn supports(&self, reflection: &Reflection, object: &JsonReflection) -> bool;

    /// Populate `id` from `object`.
    ///
    /// Types and comments still hold the input's ids at this point; fix up
    /// cross references from a callback passed to [`ReviveContext::defer`].
    fn from_object(&self, context: &mut ReviveContext<'_>, id: ReflectionId, object: &JsonReflection);
}

/// Insert keeping the list ordered by descending priority, stable for ties.
pub(crate) fn insert_by_priority<T: ?Sized>(
    list: &mut Vec<Box<T>>,
    component: Box<T>,
    priority: impl Fn(&T) -> i32,
) {
    let p = priority(component.as_ref());
    let at = list
        .iter()
        .position(|existing| priority(existing.as_ref()) < p)
        .unwrap_or(list.len());
    list.insert(at, component);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Prio(i32, &'static str);

    impl SerializerComponent for Prio {
        fn priority(&self) -> i32 {
            self.0
        }
        fn supports(&self, _: &Reflection) -> bool {
            true
        }
        fn to_object(&self, _: &Reflection, _: &Project, _: &mut JsonReflection) {}
    }

    #[test]
    fn ordered_by_descending_priority_stable_for_ties() {
        let mut list: Vec<Box<Prio>> = Vec::new();
        for (p, name) in [(0, "a"), (10, "b"), (0, "c"), (5, "d")] {
            insert_by_priority(&mut list, Box::new(Prio(p, name)), |c| c.0);
        }
        let names: Vec<&str> = list.iter().map(|c| c.1).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);

        let mut dynamic: Vec<Box<dyn SerializerComponent>> = Vec::new();
        insert_by_priority(&mut dynamic, Box::new(Prio(1, "x")), |c| c.priority());
        insert_by_priority(&mut dynamic, Box::new(Prio(3, "y")), |c| c.priority());
        assert_eq!(dynamic[0].priority(), 3);
    }
}
