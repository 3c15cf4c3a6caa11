use derive_more::IsVariant;

#[derive(Copy, Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum IntegerSign {
    Signed,
    Unsigned,
}

impl IntegerSign {
    pub fn new(is_signed: bool) -> Self {
        if is_signed {
            Self::Signed
        } else {
            Self::Unsigned
        }
    }
}
