use super::Type;

#[derive(Debug, Clone)]
pub struct Field {
    /// The field name
    pub name: String,

    /// Scalar type of the field
    pub ty: Type,

    /// True if the field can be null
    pub nullable: bool,

    /// True if the field carries a unique constraint
    pub unique: bool,

    /// True if the field is (part of) the model's identifier
    pub id: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Field {
        Field {
            name: name.into(),
            ty,
            nullable: false,
            unique: false,
            id: false,
        }
    }

    /// Marks the field as part of the model identifier. Identifier fields are
    /// implicitly unique.
    pub fn id(mut self) -> Field {
        self.id = true;
        self.unique = true;
        self
    }

    pub fn unique(mut self) -> Field {
        self.unique = true;
        self
    }

    pub fn nullable(mut self) -> Field {
        self.nullable = true;
        self
    }

    /// True if an equality on this field selects at most one record.
    pub fn is_unique(&self) -> bool {
        self.id || self.unique
    }
}
