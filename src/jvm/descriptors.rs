use super::{BinaryName, Name, UnqualifiedName};

/// Utility trait for rendering types in class file notation
///
/// Every type has two renderings: the full generic signature (what the `Signature` attribute
/// holds, type arguments and type variables included) and the erased signature (what descriptors
/// and the JVM's method dispatch see). The two agree on types that mention no generics.
pub trait RenderSignature {
    /// Write the full generic signature
    fn append_signature(&self, write_to: &mut String);

    /// Write the erased signature
    fn append_erased_signature(&self, write_to: &mut String);

    fn signature(&self) -> String {
        let mut string = String::new();
        self.append_signature(&mut string);
        string
    }

    fn erased_signature(&self) -> String {
        let mut string = String::new();
        self.append_erased_signature(&mut string);
        string
    }
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub fn descriptor_char(&self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    pub fn from_descriptor_char(c: char) -> Option<BaseType> {
        let typ = match c {
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'D' => BaseType::Double,
            'F' => BaseType::Float,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'S' => BaseType::Short,
            'Z' => BaseType::Boolean,
            _ => return None,
        };
        Some(typ)
    }
}

impl RenderSignature for BaseType {
    fn append_signature(&self, write_to: &mut String) {
        write_to.push(self.descriptor_char());
    }

    fn append_erased_signature(&self, write_to: &mut String) {
        write_to.push(self.descriptor_char());
    }
}

/// Any type that can appear as a parameter, return value, field, or thrown exception
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeReference {
    Primitive(BaseType),
    Class(ClassType),
    Array(Box<TypeReference>),
    Variable(TypeVariable),
}

/// Class or interface type, possibly applied to type arguments
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ClassType {
    /// Binary name of the class (for nested classes, this is the `Outer$Inner` name)
    pub name: BinaryName,

    /// Type arguments (empty for raw or non-generic uses)
    pub arguments: Vec<TypeArgument>,

    /// Generic enclosing class, when an inner class is selected out of a parameterized outer
    /// class (`Outer<T>.Inner`)
    pub outer: Option<Box<ClassType>>,
}

/// Argument to a generic class
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeArgument {
    /// `?`
    Wildcard,

    /// `? extends T`
    Extends(TypeReference),

    /// `? super T`
    Super(TypeReference),

    /// `T`
    Exact(TypeReference),
}

/// Use of a type parameter
///
/// The erasure is fixed when the variable is created (it is the erasure of the parameter's first
/// bound), so that recursive bounds like `T extends Comparable<T>` do not make types infinite.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeVariable {
    pub name: UnqualifiedName,
    pub erasure: BinaryName,
}

/// Declaration of a type parameter on a class or method
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct GenericParameter {
    pub name: UnqualifiedName,

    /// Class bound (`T:Ljava/lang/Number;`)
    pub class_bound: Option<TypeReference>,

    /// Interface bounds (`T::Ljava/lang/Comparable<TT;>;`)
    pub interface_bounds: Vec<TypeReference>,
}

impl TypeReference {
    pub fn object(name: BinaryName) -> TypeReference {
        TypeReference::Class(ClassType {
            name,
            arguments: vec![],
            outer: None,
        })
    }

    pub const fn int() -> TypeReference {
        TypeReference::Primitive(BaseType::Int)
    }

    pub fn array(element_type: TypeReference) -> TypeReference {
        TypeReference::Array(Box::new(element_type))
    }

    /// Class applied to some type arguments (`List<String>`)
    pub fn generic(name: BinaryName, arguments: Vec<TypeArgument>) -> TypeReference {
        TypeReference::Class(ClassType {
            name,
            arguments,
            outer: None,
        })
    }

    pub fn variable(name: UnqualifiedName, erasure: BinaryName) -> TypeReference {
        TypeReference::Variable(TypeVariable { name, erasure })
    }

    /// Same type with all generic information removed
    pub fn erasure(&self) -> TypeReference {
        match self {
            TypeReference::Primitive(base) => TypeReference::Primitive(*base),
            TypeReference::Class(class) => TypeReference::object(class.name.clone()),
            TypeReference::Array(element) => TypeReference::array(element.erasure()),
            TypeReference::Variable(variable) => TypeReference::object(variable.erasure.clone()),
        }
    }

    /// Does this type mention type arguments or type variables anywhere?
    pub fn is_generic(&self) -> bool {
        match self {
            TypeReference::Primitive(_) => false,
            TypeReference::Class(class) => class.is_generic(),
            TypeReference::Array(element) => element.is_generic(),
            TypeReference::Variable(_) => true,
        }
    }

    /// Class a member lookup on this type should start from
    ///
    /// Arrays only have the members they inherit from `java/lang/Object`.
    pub fn erased_class_name(&self) -> Option<BinaryName> {
        match self {
            TypeReference::Primitive(_) => None,
            TypeReference::Class(class) => Some(class.name.clone()),
            TypeReference::Array(_) => Some(BinaryName::OBJECT),
            TypeReference::Variable(variable) => Some(variable.erasure.clone()),
        }
    }
}

impl ClassType {
    fn is_generic(&self) -> bool {
        !self.arguments.is_empty() || self.outer.iter().any(|outer| outer.is_generic())
    }

    /// Write the class body without the leading `L` and trailing `;`
    fn append_body(&self, write_to: &mut String) {
        match &self.outer {
            None => write_to.push_str(self.name.as_str()),
            Some(outer) => {
                outer.append_body(write_to);
                write_to.push('.');
                let simple_name = self
                    .name
                    .as_str()
                    .strip_prefix(outer.name.as_str())
                    .and_then(|rest| rest.strip_prefix('$'))
                    .unwrap_or_else(|| self.name.as_str());
                write_to.push_str(simple_name);
            }
        }
        if !self.arguments.is_empty() {
            write_to.push('<');
            for argument in &self.arguments {
                argument.append_signature(write_to);
            }
            write_to.push('>');
        }
    }
}

impl RenderSignature for ClassType {
    fn append_signature(&self, write_to: &mut String) {
        write_to.push('L');
        self.append_body(write_to);
        write_to.push(';');
    }

    fn append_erased_signature(&self, write_to: &mut String) {
        write_to.push('L');
        write_to.push_str(self.name.as_str());
        write_to.push(';');
    }
}

impl RenderSignature for TypeReference {
    fn append_signature(&self, write_to: &mut String) {
        match self {
            TypeReference::Primitive(base) => base.append_signature(write_to),
            TypeReference::Class(class) => class.append_signature(write_to),
            TypeReference::Array(element) => {
                write_to.push('[');
                element.append_signature(write_to);
            }
            TypeReference::Variable(variable) => {
                write_to.push('T');
                write_to.push_str(variable.name.as_str());
                write_to.push(';');
            }
        }
    }

    fn append_erased_signature(&self, write_to: &mut String) {
        match self {
            TypeReference::Primitive(base) => base.append_erased_signature(write_to),
            TypeReference::Class(class) => class.append_erased_signature(write_to),
            TypeReference::Array(element) => {
                write_to.push('[');
                element.append_erased_signature(write_to);
            }
            TypeReference::Variable(variable) => {
                write_to.push('L');
                write_to.push_str(variable.erasure.as_str());
                write_to.push(';');
            }
        }
    }
}

impl TypeArgument {
    fn append_signature(&self, write_to: &mut String) {
        match self {
            TypeArgument::Wildcard => write_to.push('*'),
            TypeArgument::Extends(bound) => {
                write_to.push('+');
                bound.append_signature(write_to);
            }
            TypeArgument::Super(bound) => {
                write_to.push('-');
                bound.append_signature(write_to);
            }
            TypeArgument::Exact(argument) => argument.append_signature(write_to),
        }
    }
}

impl GenericParameter {
    /// Type parameter bounded only by `java/lang/Object`
    pub fn unbounded(name: UnqualifiedName) -> GenericParameter {
        GenericParameter {
            name,
            class_bound: Some(TypeReference::object(BinaryName::OBJECT)),
            interface_bounds: vec![],
        }
    }

    /// Erasure of the leftmost bound
    pub fn erasure(&self) -> BinaryName {
        self.class_bound
            .iter()
            .chain(self.interface_bounds.iter())
            .next()
            .and_then(TypeReference::erased_class_name)
            .unwrap_or(BinaryName::OBJECT)
    }

    /// A use of this parameter as a type
    pub fn as_type(&self) -> TypeReference {
        TypeReference::variable(self.name.clone(), self.erasure())
    }
}

impl RenderSignature for GenericParameter {
    fn append_signature(&self, write_to: &mut String) {
        write_to.push_str(self.name.as_str());
        write_to.push(':');
        if let Some(class_bound) = &self.class_bound {
            class_bound.append_signature(write_to);
        }
        for interface_bound in &self.interface_bounds {
            write_to.push(':');
            interface_bound.append_signature(write_to);
        }
    }

    /// Type parameters vanish under erasure
    fn append_erased_signature(&self, _write_to: &mut String) {}
}
