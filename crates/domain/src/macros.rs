//! Helper macros for string-backed enums.
//!
//! Every enumerated column is stored as TEXT and travels over the wire in
//! snake_case, so each enum needs the same `as_str` / `Display` / `FromStr`
//! trio. `string_enum!` generates it from one variant table.

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the string representation for database storage.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(format!(
                        "Invalid {}: {}. Must be one of: {}",
                        $label,
                        s,
                        [$($value),+].join(", ")
                    )),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    string_enum! {
        #[derive(Default)]
        pub enum Sample: "sample" {
            #[default]
            First => "first",
            SecondValue => "second_value",
        }
    }

    #[test]
    fn test_generated_conversions() {
        assert_eq!(Sample::SecondValue.as_str(), "second_value");
        assert_eq!(Sample::First.to_string(), "first");
        assert_eq!("second_value".parse::<Sample>().unwrap(), Sample::SecondValue);
        assert_eq!(Sample::default(), Sample::First);
        assert_eq!(Sample::ALL.len(), 2);
    }

    #[test]
    fn test_generated_error_lists_values() {
        let err = "third".parse::<Sample>().unwrap_err();
        assert_eq!(err, "Invalid sample: third. Must be one of: first, second_value");
    }

    #[test]
    fn test_generated_serde_uses_wire_names() {
        let json = serde_json::to_string(&Sample::SecondValue).unwrap();
        assert_eq!(json, "\"second_value\"");
        let parsed: Sample = serde_json::from_str("\"first\"").unwrap();
        assert_eq!(parsed, Sample::First);
    }
}
