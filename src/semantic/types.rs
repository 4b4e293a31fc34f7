//! Value types seen by the checker and the IR generator

use crate::parser::ast::{BaseType, NodeId, TypeName};
use rustc_hash::FxHashMap;
use std::fmt;

/// Type of a value: a base type, optionally an array of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    pub base: BaseType,
    pub is_array: bool,
}

impl ValueType {
    pub const INT: ValueType = ValueType::scalar(BaseType::Int);
    pub const FLOAT: ValueType = ValueType::scalar(BaseType::Float);

    pub const fn scalar(base: BaseType) -> Self {
        ValueType {
            base,
            is_array: false,
        }
    }

    pub const fn array(base: BaseType) -> Self {
        ValueType {
            base,
            is_array: true,
        }
    }

    /// Element type of an array, or the type itself for scalars
    pub fn element(&self) -> ValueType {
        ValueType::scalar(self.base)
    }
}

impl From<&TypeName> for ValueType {
    fn from(type_name: &TypeName) -> Self {
        ValueType {
            base: type_name.base,
            is_array: type_name.is_array(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.base)
        } else {
            write!(f, "{}", self.base)
        }
    }
}

/// Side-map from expression node ids to their checked types
pub type TypeTable = FxHashMap<NodeId, ValueType>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::ArraySize;

    #[test]
    fn test_display() {
        assert_eq!(ValueType::INT.to_string(), "int");
        assert_eq!(ValueType::array(BaseType::Float).to_string(), "float[]");
    }

    #[test]
    fn test_from_type_name() {
        let name = TypeName::array(BaseType::Int, ArraySize::Fixed(4));
        let ty = ValueType::from(&name);

        assert!(ty.is_array);
        assert_eq!(ty.element(), ValueType::INT);
    }
}
