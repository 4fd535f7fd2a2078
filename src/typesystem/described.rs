// Tue Jan 13 2026 - Alex

use crate::memory::{ByteBuffer, MemoryView, NativeSize};
use crate::typesystem::{TypeSystem, TypeSystemError};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDescription {
    pub pointer_size: usize,
    pub object_header_size: i32,
    pub array_header_size: i32,
    #[serde(default)]
    pub types: Vec<TypeDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDescription {
    pub assembly: String,
    pub name: String,
    #[serde(default)]
    pub base: Option<i32>,
    #[serde(default)]
    pub value_type: bool,
    #[serde(default)]
    pub array: bool,
    #[serde(default)]
    pub size: i32,
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
    /// Value of the type-information word in the header of instances.
    #[serde(default)]
    pub type_word: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub type_index: i32,
    #[serde(default)]
    pub offset: i32,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub static_data: Option<Vec<u8>>,
}

/// Type system backed by a plain description, e.g. a JSON export of a
/// snapshot's type table.
pub struct DescribedTypeSystem {
    description: LayoutDescription,
    pointer_size: NativeSize,
    statics: AHashMap<(i32, i32), MemoryView>,
}

impl DescribedTypeSystem {
    pub fn from_description(description: LayoutDescription) -> Result<Self, TypeSystemError> {
        let pointer_size = NativeSize::from_bytes(description.pointer_size)?;
        let count = description.types.len() as i32;
        let check = |type_index: i32, referenced: i32| {
            if referenced < 0 || referenced >= count {
                Err(TypeSystemError::UnknownTypeIndex { type_index, referenced })
            } else {
                Ok(())
            }
        };

        let mut statics = AHashMap::new();
        for (type_index, ty) in description.types.iter().enumerate() {
            let type_index = type_index as i32;
            if let Some(base) = ty.base {
                check(type_index, base)?;
            }
            if ty.array && ty.base.is_none() {
                return Err(TypeSystemError::ValidationFailed(format!(
                    "array type {} has no element type",
                    ty.name
                )));
            }
            for (field_number, field) in ty.fields.iter().enumerate() {
                check(type_index, field.type_index)?;
                if let (true, Some(data)) = (field.is_static, &field.static_data) {
                    let view = MemoryView::whole(Arc::new(ByteBuffer::from_vec(data.clone())));
                    statics.insert((type_index, field_number as i32), view);
                }
            }
        }

        for type_index in 0..count {
            let mut current = &description.types[type_index as usize];
            let mut steps = 0;
            while let (false, Some(base)) = (current.array, current.base) {
                steps += 1;
                if steps > count {
                    return Err(TypeSystemError::ValidationFailed(format!(
                        "base type chain of {} is cyclic",
                        description.types[type_index as usize].name
                    )));
                }
                current = &description.types[base as usize];
            }
        }

        Ok(Self {
            description,
            pointer_size,
            statics,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, TypeSystemError> {
        let description: LayoutDescription = serde_json::from_str(text)?;
        Self::from_description(description)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TypeSystemError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// `(type word, type index)` for every type that declares one.
    pub fn type_words(&self) -> impl Iterator<Item = (u64, i32)> + '_ {
        self.description
            .types
            .iter()
            .enumerate()
            .filter_map(|(index, ty)| ty.type_word.map(|word| (word, index as i32)))
    }

    fn ty(&self, type_index: i32) -> &TypeDescription {
        &self.description.types[type_index as usize]
    }

    fn field(&self, type_index: i32, field_number: i32) -> &FieldDescription {
        &self.ty(type_index).fields[field_number as usize]
    }
}

impl TypeSystem for DescribedTypeSystem {
    fn pointer_size(&self) -> NativeSize {
        self.pointer_size
    }

    fn number_of_types(&self) -> i32 {
        self.description.types.len() as i32
    }

    fn assembly(&self, type_index: i32) -> &str {
        &self.ty(type_index).assembly
    }

    fn qualified_name(&self, type_index: i32) -> &str {
        &self.ty(type_index).name
    }

    fn base_or_element_type_index(&self, type_index: i32) -> Option<i32> {
        self.ty(type_index).base
    }

    fn base_size(&self, type_index: i32) -> i32 {
        self.ty(type_index).size
    }

    fn is_value_type(&self, type_index: i32) -> bool {
        self.ty(type_index).value_type
    }

    fn is_array(&self, type_index: i32) -> bool {
        self.ty(type_index).array
    }

    fn number_of_fields(&self, type_index: i32) -> i32 {
        self.ty(type_index).fields.len() as i32
    }

    fn field_type(&self, type_index: i32, field_number: i32) -> i32 {
        self.field(type_index, field_number).type_index
    }

    fn field_offset(&self, type_index: i32, field_number: i32, with_header: bool) -> i32 {
        let offset = self.field(type_index, field_number).offset;
        if with_header && !self.is_value_type(type_index) {
            offset + self.description.object_header_size
        } else {
            offset
        }
    }

    fn field_name(&self, type_index: i32, field_number: i32) -> &str {
        &self.field(type_index, field_number).name
    }

    fn field_is_static(&self, type_index: i32, field_number: i32) -> bool {
        self.field(type_index, field_number).is_static
    }

    fn static_field_bytes(&self, type_index: i32, field_number: i32) -> Option<MemoryView> {
        self.statics.get(&(type_index, field_number)).cloned()
    }

    fn object_header_size(&self) -> i32 {
        self.description.object_header_size
    }

    fn array_first_element_offset(&self, _type_index: i32) -> i32 {
        self.description.array_header_size
    }
}

/// Incremental construction of a [`LayoutDescription`].
pub struct LayoutBuilder {
    description: LayoutDescription,
}

impl LayoutBuilder {
    pub fn new(pointer_size: NativeSize, object_header_size: i32, array_header_size: i32) -> Self {
        Self {
            description: LayoutDescription {
                pointer_size: pointer_size.size(),
                object_header_size,
                array_header_size,
                types: Vec::new(),
            },
        }
    }

    fn push(&mut self, ty: TypeDescription) -> i32 {
        self.description.types.push(ty);
        self.description.types.len() as i32 - 1
    }

    pub fn class(&mut self, assembly: &str, name: &str, base: Option<i32>, size: i32) -> i32 {
        self.push(TypeDescription {
            assembly: assembly.to_string(),
            name: name.to_string(),
            base,
            value_type: false,
            array: false,
            size,
            fields: Vec::new(),
            type_word: None,
        })
    }

    pub fn value_type(&mut self, assembly: &str, name: &str, size: i32) -> i32 {
        self.push(TypeDescription {
            assembly: assembly.to_string(),
            name: name.to_string(),
            base: None,
            value_type: true,
            array: false,
            size,
            fields: Vec::new(),
            type_word: None,
        })
    }

    pub fn array(&mut self, assembly: &str, element: i32) -> i32 {
        let name = format!("{}[]", self.description.types[element as usize].name);
        self.push(TypeDescription {
            assembly: assembly.to_string(),
            name,
            base: Some(element),
            value_type: false,
            array: true,
            size: self.description.array_header_size,
            fields: Vec::new(),
            type_word: None,
        })
    }

    pub fn field(&mut self, type_index: i32, name: &str, field_type: i32, offset: i32) -> i32 {
        let fields = &mut self.description.types[type_index as usize].fields;
        fields.push(FieldDescription {
            name: name.to_string(),
            type_index: field_type,
            offset,
            is_static: false,
            static_data: None,
        });
        fields.len() as i32 - 1
    }

    pub fn static_field(&mut self, type_index: i32, name: &str, field_type: i32, data: Vec<u8>) -> i32 {
        let fields = &mut self.description.types[type_index as usize].fields;
        fields.push(FieldDescription {
            name: name.to_string(),
            type_index: field_type,
            offset: 0,
            is_static: true,
            static_data: Some(data),
        });
        fields.len() as i32 - 1
    }

    pub fn set_type_word(&mut self, type_index: i32, word: u64) {
        self.description.types[type_index as usize].type_word = Some(word);
    }

    pub fn build(self) -> Result<DescribedTypeSystem, TypeSystemError> {
        DescribedTypeSystem::from_description(self.description)
    }
}
