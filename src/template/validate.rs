//! Check a parsed template against the node type it belongs to.

use super::ast::{Fragment, Source, TemplateLine};
use super::TemplateErrorKind;

/// The names a template may refer to.
pub trait NameScope {
    fn has_group(&self, name: &str) -> bool;
    fn has_attribute(&self, name: &str) -> bool;
    fn has_generator(&self, name: &str) -> bool;
}

/// Resolve every `*name` source into a group or attribute source, and reject references to
/// anything the node type does not declare. Returns the offending source line on failure.
///
/// Only the first segment of a dotted path is checked: later segments are looked up on whatever
/// node the first segment holds, which is not known until render time.
pub fn validate(
    lines: &mut [TemplateLine],
    names: &dyn NameScope,
) -> Result<(), (usize, TemplateErrorKind)> {
    for line in lines {
        let source_line = line.source_line;
        for fragment in &mut line.fragments {
            validate_fragment(fragment, names).map_err(|kind| (source_line, kind))?;
        }
    }
    Ok(())
}

fn validate_fragment(
    fragment: &mut Fragment,
    names: &dyn NameScope,
) -> Result<(), TemplateErrorKind> {
    use TemplateErrorKind::*;

    match fragment {
        Fragment::Literal(_) => Ok(()),
        Fragment::Attribute(path) if names.has_attribute(path.first()) => Ok(()),
        Fragment::Attribute(path) => Err(UnknownAttribute(path.first().to_owned())),
        Fragment::Expansion(exp) => {
            for source in &mut exp.sources {
                let resolved = match source {
                    Source::Star { name, format } if names.has_group(name) => Source::Group {
                        group: std::mem::take(name),
                        format: format.take(),
                    },
                    Source::Star { name, format } if names.has_attribute(name) => {
                        Source::Attribute {
                            path: super::ast::AttrPath(vec![std::mem::take(name)]),
                            format: format.take(),
                        }
                    }
                    Source::Star { name, .. } => return Err(UnknownGroup(name.clone())),
                    Source::Attribute { path, .. } if !names.has_attribute(path.first()) => {
                        return Err(UnknownAttribute(path.first().to_owned()))
                    }
                    Source::Generator(name) if !names.has_generator(name) => {
                        return Err(UnknownGenerator(name.clone()))
                    }
                    Source::Group { .. } | Source::Attribute { .. } | Source::Generator(_) => {
                        continue
                    }
                };
                *source = resolved;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parser::parse_template;

    struct Names;

    impl NameScope for Names {
        fn has_group(&self, name: &str) -> bool {
            name == "Body"
        }
        fn has_attribute(&self, name: &str) -> bool {
            matches!(name, "name" | "description")
        }
        fn has_generator(&self, name: &str) -> bool {
            name == "attr_values"
        }
    }

    #[test]
    fn star_sources_resolve_to_groups_or_attributes() {
        let mut lines = parse_template("{*Body} {*description} {@attr_values} {name}").unwrap();
        validate(&mut lines, &Names).unwrap();
        let sources: Vec<String> = lines[0]
            .fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::Expansion(exp) => Some(format!("{:?}", exp.sources[0])),
                _ => None,
            })
            .collect();
        assert!(sources[0].starts_with("Group"));
        assert!(sources[1].starts_with("Attribute"));
        assert!(sources[2].starts_with("Generator"));
    }

    #[test]
    fn undeclared_names_are_rejected_with_their_line() {
        let mut lines = parse_template("ok\n{*Tail}").unwrap();
        assert_eq!(
            validate(&mut lines, &Names),
            Err((2, TemplateErrorKind::UnknownGroup("Tail".to_owned())))
        );

        let mut lines = parse_template("{.nope}").unwrap();
        assert_eq!(
            validate(&mut lines, &Names),
            Err((1, TemplateErrorKind::UnknownAttribute("nope".to_owned())))
        );

        let mut lines = parse_template("{@nope}").unwrap();
        assert_eq!(
            validate(&mut lines, &Names),
            Err((1, TemplateErrorKind::UnknownGenerator("nope".to_owned())))
        );

        let mut lines = parse_template("{nope.x}").unwrap();
        assert_eq!(
            validate(&mut lines, &Names),
            Err((1, TemplateErrorKind::UnknownAttribute("nope".to_owned())))
        );
    }
}
