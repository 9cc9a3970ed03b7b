use std::collections::HashSet;

use crate::digest::{Digester, scrub};
use crate::error::{Error, Result, ValidationError};
use crate::spec::Spec;

/// Rendered tag pairs, sorted by tag name.
pub(crate) type TagPairs = Vec<(String, String)>;

/// Validated, scrubbed form of a [`Spec`].
///
/// Everything past the scope layer can assume the declaration it holds is
/// well-formed.
#[derive(Debug)]
pub(crate) struct Metadata {
    name: String,
    help: String,
    dims: Vec<u8>,
    disable_push: bool,
    const_pairs: TagPairs,
    var_names: Vec<String>,
    // Variable tag names as declared; lookups must match these exactly.
    declared_vars: Vec<String>,
}

impl Metadata {
    pub(crate) fn new(spec: &Spec) -> std::result::Result<Self, ValidationError> {
        let mut const_names = HashSet::with_capacity(spec.const_tags.len());
        let mut const_pairs = Vec::with_capacity(spec.const_tags.len());
        for (name, value) in &spec.const_tags {
            let name = scrub(name).into_owned();
            if !const_names.insert(name.clone()) {
                return Err(ValidationError::DuplicateTag(name));
            }
            const_pairs.push((name, scrub(value).into_owned()));
        }
        const_pairs.sort();

        let mut var_set = HashSet::with_capacity(spec.var_tags.len());
        let mut var_names = Vec::with_capacity(spec.var_tags.len());
        for name in &spec.var_tags {
            let name = scrub(name).into_owned();
            if const_names.contains(&name) {
                return Err(ValidationError::TagOverlap(name));
            }
            if !var_set.insert(name.clone()) {
                return Err(ValidationError::DuplicateVariableTag(name));
            }
            var_names.push(name);
        }

        let name = scrub(&spec.name).into_owned();
        let dims = make_dims(&name, &const_pairs, &var_names);
        Ok(Self {
            name,
            help: spec.help.clone(),
            dims,
            disable_push: spec.disable_push,
            const_pairs,
            var_names,
            declared_vars: spec.var_tags.clone(),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn help(&self) -> &str {
        &self.help
    }

    pub(crate) fn dims(&self) -> &[u8] {
        &self.dims
    }

    pub(crate) fn disable_push(&self) -> bool {
        self.disable_push
    }

    pub(crate) fn const_pairs(&self) -> &TagPairs {
        &self.const_pairs
    }

    /// Writes the metric's identity: name plus constant tag names and values.
    pub(crate) fn write_id(&self, d: &mut Digester) {
        d.add("", &self.name);
        for (name, value) in &self.const_pairs {
            d.add("", name);
            d.add("", value);
        }
    }

    /// Checks caller-supplied variable tags against the declared names and
    /// order. Names must match the declaration exactly, before scrubbing.
    pub(crate) fn validate_var_tags(&self, pairs: &[(&str, &str)]) -> Result<()> {
        if pairs.len() != self.declared_vars.len() {
            return Err(Error::CardinalityMismatch {
                expected: self.declared_vars.len(),
                actual: pairs.len(),
            });
        }
        let declared = self.declared_vars.iter().zip(pairs);
        for (index, (expected, (actual, _))) in declared.enumerate() {
            if expected.as_str() != *actual {
                return Err(Error::TagOrderMismatch {
                    index,
                    expected: expected.clone(),
                    actual: actual.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merges constant tags with already-validated variable tags.
    pub(crate) fn merge_tags(&self, pairs: &[(&str, &str)]) -> TagPairs {
        let mut merged = Vec::with_capacity(self.const_pairs.len() + pairs.len());
        merged.extend(self.const_pairs.iter().cloned());
        for (name, (_, value)) in self.var_names.iter().zip(pairs) {
            merged.push((name.clone(), scrub(value).into_owned()));
        }
        merged.sort();
        merged
    }
}

fn make_dims(name: &str, const_pairs: &TagPairs, var_names: &[String]) -> Vec<u8> {
    let mut sorted_vars: Vec<&str> = var_names.iter().map(String::as_str).collect();
    sorted_vars.sort_unstable();

    let mut d = Digester::new();
    d.add("", name);
    for (n, _) in const_pairs {
        d.add("", n);
    }
    // `$` can't survive scrubbing, so variable names never collide with
    // constant ones.
    for n in sorted_vars {
        d.add("$", n);
    }
    d.digest().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(meta: &Metadata) -> Vec<u8> {
        let mut d = Digester::new();
        meta.write_id(&mut d);
        d.digest().to_vec()
    }

    #[test]
    fn test_scrubs_name_and_tags() {
        let meta = Metadata::new(
            &Spec::new("foo:bar", "help")
                .const_tag("b&r", "baz!")
                .var_tags(["q&x"]),
        )
        .unwrap();
        assert_eq!(meta.name(), "foo_bar");
        assert_eq!(
            meta.const_pairs(),
            &vec![("b_r".to_string(), "baz_".to_string())]
        );
        assert_eq!(meta.var_names, vec!["q_x"]);
    }

    #[test]
    fn test_const_pairs_sorted_after_scrubbing() {
        let meta = Metadata::new(
            &Spec::new("foo", "help")
                .const_tag("b", "1")
                .const_tag("a&", "2"),
        )
        .unwrap();
        let names: Vec<_> = meta.const_pairs().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a_", "b"]);
    }

    #[test]
    fn test_duplicate_const_tags_after_scrubbing() {
        let err = Metadata::new(&Spec::new("foo", "help").const_tags([("f_", "ok"), ("f&", "ok")]))
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateTag("f_".to_string()));
    }

    #[test]
    fn test_duplicate_var_tags_after_scrubbing() {
        let err = Metadata::new(&Spec::new("foo", "help").var_tags(["f__", "f&&"])).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateVariableTag("f__".to_string()));
    }

    #[test]
    fn test_var_tag_overlapping_const_tag() {
        let err = Metadata::new(
            &Spec::new("foo", "help")
                .const_tag("foo", "one")
                .var_tags(["foo"]),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::TagOverlap("foo".to_string()));
    }

    #[test]
    fn test_dims_ignore_values_but_not_names() {
        let a = Metadata::new(&Spec::new("dims", "help").const_tag("bar", "baz")).unwrap();
        let b = Metadata::new(&Spec::new("dims", "help").const_tag("bar", "quux")).unwrap();
        let c = Metadata::new(&Spec::new("dims", "help").const_tag("bing", "quux")).unwrap();
        assert_eq!(a.dims(), b.dims());
        assert_ne!(a.dims(), c.dims());
        assert_ne!(id(&a), id(&b));
    }

    #[test]
    fn test_dims_distinguish_variable_tags() {
        let vector = Metadata::new(
            &Spec::new("ownership", "help")
                .const_tag("foo", "bar")
                .var_tags(["baz"]),
        )
        .unwrap();
        let scalar = Metadata::new(
            &Spec::new("ownership", "help")
                .const_tag("foo", "bar")
                .const_tag("baz", "quux"),
        )
        .unwrap();
        assert_ne!(vector.dims(), scalar.dims());
    }

    #[test]
    fn test_dims_ignore_variable_tag_order() {
        let a = Metadata::new(&Spec::new("foo", "help").var_tags(["a", "b"])).unwrap();
        let b = Metadata::new(&Spec::new("foo", "help").var_tags(["b", "a"])).unwrap();
        assert_eq!(a.dims(), b.dims());
    }

    #[test]
    fn test_identity_ignores_help() {
        let a = Metadata::new(&Spec::new("foo", "help")).unwrap();
        let b = Metadata::new(&Spec::new("foo", "different help")).unwrap();
        assert_eq!(id(&a), id(&b));
    }

    #[test]
    fn test_validate_var_tags() {
        let meta = Metadata::new(&Spec::new("foo", "help").var_tags(["quux", "baz"])).unwrap();
        assert!(meta.validate_var_tags(&[("quux", "1"), ("baz", "2")]).is_ok());
        assert!(matches!(
            meta.validate_var_tags(&[("quux", "1")]),
            Err(Error::CardinalityMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            meta.validate_var_tags(&[("baz", "2"), ("quux", "1")]),
            Err(Error::TagOrderMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_var_tags_compares_declared_names() {
        let meta = Metadata::new(&Spec::new("foo", "help").var_tags(["q&x"])).unwrap();
        assert_eq!(meta.var_names, vec!["q_x"]);
        assert!(meta.validate_var_tags(&[("q&x", "1")]).is_ok());
        for other in ["q!x", "q_x"] {
            match meta.validate_var_tags(&[(other, "1")]) {
                Err(Error::TagOrderMismatch {
                    index: 0,
                    expected,
                    actual,
                }) => {
                    assert_eq!(expected, "q&x");
                    assert_eq!(actual, other);
                }
                res => panic!("unexpected result for {other}: {res:?}"),
            }
        }
    }

    #[test]
    fn test_merge_tags_sorted_and_scrubbed() {
        let meta = Metadata::new(
            &Spec::new("foo", "help")
                .const_tag("foo", "counter")
                .var_tags(["quux", "baz"]),
        )
        .unwrap();
        let merged = meta.merge_tags(&[("quux", "x!"), ("baz", "y")]);
        assert_eq!(
            merged,
            vec![
                ("baz".to_string(), "y".to_string()),
                ("foo".to_string(), "counter".to_string()),
                ("quux".to_string(), "x_".to_string()),
            ]
        );
    }
}
