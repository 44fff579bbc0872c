//! Turn a [`Selection`] into the list of courses to back up.
//!
//! Pure lookups against the [`Catalog`]: nothing here touches the disk, so
//! every rule is unit-testable with an in-memory catalog.

use crate::{
    catalog::{Catalog, Course},
    cli::Selection,
    error::BackupError,
};

/// Resolve `selection` against `catalog`.
///
/// Single-course selections must match exactly one course.  A category
/// selection must name an existing category; it yields that category's own
/// courses followed, when recursive, by the courses of every descendant
/// category.  An existing category without courses yields an empty list.
pub fn courses<'a>(
    catalog: &'a Catalog,
    selection: &Selection,
) -> Result<Vec<&'a Course>, BackupError> {
    match selection {
        Selection::CourseId(id) => Ok(vec![catalog.course_by_id(*id)?]),
        Selection::CourseShortname(name) => Ok(vec![catalog.course_by_shortname(name)?]),
        Selection::Category { id, recursive } => {
            let category = catalog.category_by_id(*id)?;
            let mut found = catalog.courses_in_category(category.id);
            if *recursive {
                for child in catalog.descendant_categories(category) {
                    found.extend(catalog.courses_in_category(child.id));
                }
            }
            tracing::debug!(
                category = category.id,
                name = %category.name,
                recursive,
                courses = found.len(),
                "resolved category"
            );
            Ok(found)
        },
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample;

    fn ids(selection: Selection) -> Vec<i64> {
        let catalog = sample();
        courses(&catalog, &selection)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect()
    }

    #[test]
    fn course_id_resolves_single_course() {
        assert_eq!(ids(Selection::CourseId(6)), vec![6]);
    }

    #[test]
    fn shortname_resolves_single_course() {
        assert_eq!(ids(Selection::CourseShortname("BIO".into())), vec![3]);
    }

    #[test]
    fn category_without_recursion_keeps_direct_courses_only() {
        assert_eq!(
            ids(Selection::Category {
                id: 5,
                recursive: false
            }),
            vec![3, 4]
        );
    }

    #[test]
    fn recursive_category_adds_every_descendant() {
        // Direct courses of 5, then category 7, then 9.  Categories 15 and 51
        // share digits with 5 but are not below it.
        assert_eq!(
            ids(Selection::Category {
                id: 5,
                recursive: true
            }),
            vec![3, 4, 6, 8]
        );
    }

    #[test]
    fn recursive_leaf_category_equals_direct_courses() {
        assert_eq!(
            ids(Selection::Category {
                id: 9,
                recursive: true
            }),
            vec![8]
        );
    }

    #[test]
    fn unknown_category_is_fatal() {
        let catalog = sample();
        let err = courses(&catalog, &Selection::Category {
            id: 404,
            recursive: true,
        })
        .unwrap_err();
        assert!(matches!(err, BackupError::RecordNotFound { .. }));
    }

    #[test]
    fn unknown_shortname_is_fatal() {
        let catalog = sample();
        assert!(courses(&catalog, &Selection::CourseShortname("nope".into())).is_err());
    }
}
