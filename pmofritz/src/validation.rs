//! Validation des arguments d'une action contre son schéma SCPD

use crate::error::{FritzError, Result};
use crate::scpd::{ArgumentSet, Direction};
use indexmap::IndexMap;

/// Arguments fournis à une action, dans l'ordre d'émission
pub type ActionArgs = IndexMap<String, String>;

/// Vérifie les arguments fournis pour `action`
///
/// Avec des arguments : la première clé inconnue (ordre de l'appelant)
/// donne `InvalidArgument`, puis tous les arguments `in` absents sont
/// listés ensemble dans `MissingArguments`, dans l'ordre du schéma.
///
/// Sans arguments (ou avec une liste vide) : le premier argument `in` du
/// schéma donne `MissingArgument`.
pub fn check_arguments(action: &str, schema: &ArgumentSet, supplied: Option<&ActionArgs>) -> Result<()> {
    let inputs = schema
        .values()
        .filter(|argument| argument.direction == Direction::In);

    let Some(supplied) = supplied.filter(|args| !args.is_empty()) else {
        return match inputs.map(|argument| &argument.name).next() {
            Some(name) => Err(FritzError::MissingArgument {
                name: name.clone(),
                action: action.to_string(),
            }),
            None => Ok(()),
        };
    };

    if let Some(unknown) = supplied.keys().find(|name| !schema.contains_key(*name)) {
        return Err(FritzError::InvalidArgument {
            name: unknown.clone(),
            action: action.to_string(),
        });
    }

    let missing = inputs
        .filter(|argument| !supplied.contains_key(&argument.name))
        .map(|argument| argument.name.as_str())
        .collect::<Vec<_>>();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FritzError::MissingArguments(missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scpd::ArgumentEntry;

    fn schema() -> ArgumentSet {
        [("A", Direction::In), ("B", Direction::In), ("C", Direction::Out)]
            .into_iter()
            .map(|(name, direction)| {
                (
                    name.to_string(),
                    ArgumentEntry {
                        name: name.to_string(),
                        direction,
                        related_state_variable: format!("Var{name}"),
                    },
                )
            })
            .collect()
    }

    fn args(pairs: &[(&str, &str)]) -> ActionArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_arguments_reports_first_input() {
        let err = check_arguments("Act", &schema(), None).unwrap_err();
        assert_eq!(err.to_string(), "Missing Argument A for Action Act");
    }

    #[test]
    fn test_empty_arguments_behave_like_none() {
        let err = check_arguments("Act", &schema(), Some(&args(&[]))).unwrap_err();
        assert_eq!(err.to_string(), "Missing Argument A for Action Act");
    }

    #[test]
    fn test_all_missing_inputs_are_listed() {
        let mut schema = schema();
        schema.insert(
            "D".to_string(),
            ArgumentEntry {
                name: "D".to_string(),
                direction: Direction::In,
                related_state_variable: "VarD".to_string(),
            },
        );
        let err = check_arguments("Act", &schema, Some(&args(&[("B", "y")]))).unwrap_err();
        assert_eq!(err.to_string(), "Missing Arguments: A, D");
    }

    #[test]
    fn test_partial_arguments() {
        let err = check_arguments("Act", &schema(), Some(&args(&[("A", "x")]))).unwrap_err();
        assert!(matches!(err, FritzError::MissingArguments(ref names) if names == "B"));
    }

    #[test]
    fn test_unknown_argument_wins_over_missing() {
        let supplied = args(&[("Z", "q"), ("A", "x")]);
        let err = check_arguments("Act", &schema(), Some(&supplied)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid Argument Z for Action Act");

        let supplied = args(&[("A", "x"), ("B", "y"), ("Z", "q")]);
        let err = check_arguments("Act", &schema(), Some(&supplied)).unwrap_err();
        assert!(err.is_argument_error());
        assert_eq!(err.to_string(), "Invalid Argument Z for Action Act");
    }

    #[test]
    fn test_complete_arguments() {
        let supplied = args(&[("B", "y"), ("A", "x")]);
        assert!(check_arguments("Act", &schema(), Some(&supplied)).is_ok());
        // un argument `out` peut être fourni sans erreur
        let supplied = args(&[("A", "x"), ("B", "y"), ("C", "z")]);
        assert!(check_arguments("Act", &schema(), Some(&supplied)).is_ok());
    }

    #[test]
    fn test_output_only_action() {
        let mut schema = schema();
        schema.retain(|_, argument| argument.direction == Direction::Out);
        assert!(check_arguments("Act", &schema, None).is_ok());
    }
}
