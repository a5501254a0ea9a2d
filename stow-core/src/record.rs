use crate::{AsValue, Result, Value};
use std::{any::TypeId, marker::PhantomData, sync::Arc};
use uuid::Uuid;

/// Static description of a record type.
#[derive(Debug, Clone, Copy)]
pub struct RecordType {
    pub id: TypeId,
    pub name: &'static str,
    pub fields: &'static [FieldDef],
}

impl RecordType {
    pub fn new<T: 'static>(fields: &'static [FieldDef]) -> Self {
        let name = std::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            name: name.rsplit("::").next().unwrap_or(name),
            fields,
        }
    }
}

/// One declared field of a record.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Rust field name.
    pub ident: &'static str,
    /// Raw mapping annotation, `None` for anonymous embeds.
    pub tag: Option<&'static str>,
    /// Type of the embedded record, for embed and inline fields.
    pub embed: Option<fn() -> RecordType>,
    /// Produces a new identifier when the field type is an [`Ident`].
    pub generate: Option<fn() -> Option<Value>>,
}

/// Read access to a field.
pub enum FieldRef<'a> {
    /// A scalar column value.
    Value(Value),
    /// Primary key of the referenced entity, `None` when unset.
    Foreign(Option<Value>),
    /// An embedded record, `None` when not allocated.
    Record(Option<&'a dyn Record>),
    Missing,
}

/// Write access to a field.
pub enum FieldMut<'a> {
    Value(&'a mut dyn Slot),
    /// Foreign keys are captured, never written into the field.
    Foreign,
    /// An embedded record, allocated on demand.
    Record(&'a mut dyn Record),
    Missing,
}

/// Schema description of a persistent type.
///
/// Usually derived with `#[derive(Record)]`. Fields are addressed by their
/// declaration index, the index of a field in `record_type().fields`.
pub trait Record: Send + Sync + 'static {
    fn record_type() -> RecordType
    where
        Self: Sized;
    fn type_info(&self) -> RecordType;
    fn field(&self, index: usize) -> FieldRef<'_>;
    fn field_mut(&mut self, index: usize) -> FieldMut<'_>;
}

/// A field that can receive a scanned value.
pub trait Slot {
    fn assign(&mut self, value: Value) -> Result<()>;
}

impl<T: AsValue> Slot for T {
    fn assign(&mut self, value: Value) -> Result<()> {
        *self = T::try_from_value(value)?;
        Ok(())
    }
}

/// Field shapes that can hold an embedded record.
pub trait Embedded {
    type Target: Record;
    fn embedded(&self) -> Option<&dyn Record>;
    fn embedded_mut(&mut self) -> &mut dyn Record;
}

impl<T: Record> Embedded for Box<T> {
    type Target = T;
    fn embedded(&self) -> Option<&dyn Record> {
        Some(self.as_ref())
    }
    fn embedded_mut(&mut self) -> &mut dyn Record {
        self.as_mut()
    }
}

impl<T: Record + Default> Embedded for Option<Box<T>> {
    type Target = T;
    fn embedded(&self) -> Option<&dyn Record> {
        self.as_deref().map(|v| v as &dyn Record)
    }
    fn embedded_mut(&mut self) -> &mut dyn Record {
        self.get_or_insert_with(Default::default).as_mut()
    }
}

/// Entities referenced through a foreign key column.
pub trait ForeignEntity {
    fn foreign_key(&self) -> Value;
}

impl<T: ForeignEntity> ForeignEntity for Box<T> {
    fn foreign_key(&self) -> Value {
        self.as_ref().foreign_key()
    }
}

impl<T: ForeignEntity> ForeignEntity for Arc<T> {
    fn foreign_key(&self) -> Value {
        self.as_ref().foreign_key()
    }
}

/// Identifier types able to produce fresh values of themselves.
pub trait Ident {
    fn new_ident() -> Self;
}

impl Ident for Uuid {
    fn new_ident() -> Self {
        Uuid::new_v4()
    }
}

impl<T: Ident> Ident for Option<T> {
    fn new_ident() -> Self {
        Some(T::new_ident())
    }
}

#[doc(hidden)]
pub struct IdentProbe<T>(PhantomData<T>);

impl<T> IdentProbe<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Ident + AsValue> IdentProbe<T> {
    pub fn generate(&self) -> Option<Value> {
        Some(T::new_ident().as_value())
    }
}

#[doc(hidden)]
pub trait IdentFallback {
    fn generate(&self) -> Option<Value> {
        None
    }
}

impl<T> IdentFallback for IdentProbe<T> {}
