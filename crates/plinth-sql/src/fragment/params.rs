use plinth_core::Value;

/// Collects bound values while a fragment is serialized.
pub trait Params {
    fn push(&mut self, param: &Value) -> Placeholder;
}

/// The 1-based position of a bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(pub usize);

impl Params for Vec<Value> {
    fn push(&mut self, value: &Value) -> Placeholder {
        self.push(value.clone());
        Placeholder(self.len())
    }
}
