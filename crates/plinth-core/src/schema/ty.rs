/// Scalar type tag of a model field.
///
/// The compiler never inspects values against the tag; it forwards the tag to
/// the field filter translator, which uses it to reject operators that make
/// no sense for the type (e.g. `contains` on a number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    I32,
    I64,
    F64,
    Decimal,
    String,
    DateTime,
    Uuid,
    Json,
    Bytes,
}

impl Type {
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::I32 | Type::I64 | Type::F64 | Type::Decimal)
    }

    /// Types that support `LIKE`-style matching.
    pub fn is_textual(self) -> bool {
        matches!(self, Type::String | Type::Uuid)
    }

    /// Types that can be summed or averaged.
    pub fn is_summable(self) -> bool {
        self.is_numeric()
    }
}

impl core::fmt::Display for Type {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let name = match self {
            Type::Bool => "Boolean",
            Type::I32 => "Int",
            Type::I64 => "BigInt",
            Type::F64 => "Float",
            Type::Decimal => "Decimal",
            Type::String => "String",
            Type::DateTime => "DateTime",
            Type::Uuid => "Uuid",
            Type::Json => "Json",
            Type::Bytes => "Bytes",
        };
        f.write_str(name)
    }
}
