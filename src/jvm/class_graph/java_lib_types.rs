use super::{ClassData, ClassGraph};
use crate::jvm::{
    BinaryName, Error, GenericParameter, MethodAccessFlags, MethodDefinition, MethodSignature,
    Name, UnqualifiedName,
};
use elsa::FrozenVec;

/// The handful of standard library types that almost every class file refers to
pub struct JavaLibrary<'g> {
    pub lang: LangClasses<'g>,
    pub io: IoClasses<'g>,
    pub util: UtilClasses<'g>,
}

/// Classes inside `java.lang.*`
pub struct LangClasses<'g> {
    pub object: &'g ClassData<'g>,
    pub cloneable: &'g ClassData<'g>,
    pub string: &'g ClassData<'g>,
    pub number: &'g ClassData<'g>,
    pub integer: &'g ClassData<'g>,
    pub throwable: &'g ClassData<'g>,
    pub error: &'g ClassData<'g>,
    pub exception: &'g ClassData<'g>,
    pub runtime_exception: &'g ClassData<'g>,
}

/// Classes inside `java.io.*`
pub struct IoClasses<'g> {
    pub serializable: &'g ClassData<'g>,
    pub io_exception: &'g ClassData<'g>,
}

/// Classes inside `java.util.*`
pub struct UtilClasses<'g> {
    pub collection: &'g ClassData<'g>,
    pub list: &'g ClassData<'g>,
}

impl<'g> JavaLibrary<'g> {
    pub fn add_to_graph(class_graph: &'g ClassGraph<'g>) -> Result<JavaLibrary<'g>, Error> {
        let object = class_graph.add_class(ClassData {
            name: BinaryName::OBJECT,
            superclass: None,
            interfaces: FrozenVec::new(),
            is_interface: false,
            generic_parameters: vec![],
            methods: FrozenVec::new(),
        });

        let cloneable = class_graph.add_class(ClassData::new(BinaryName::CLONEABLE, object, true));
        let serializable =
            class_graph.add_class(ClassData::new(BinaryName::SERIALIZABLE, object, true));
        let string = class_graph.add_class(ClassData::new(BinaryName::STRING, object, false));
        string.add_interfaces([serializable]);
        let number = class_graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("java/lang/Number"))
                .map_err(Error::InvalidArgument)?,
            object,
            false,
        ));
        number.add_interfaces([serializable]);
        let integer = class_graph.add_class(ClassData::new(BinaryName::INTEGER, number, false));

        let throwable = class_graph.add_class(ClassData::new(BinaryName::THROWABLE, object, false));
        throwable.add_interfaces([serializable]);
        let error = class_graph.add_class(ClassData::new(BinaryName::ERROR, throwable, false));
        let exception =
            class_graph.add_class(ClassData::new(BinaryName::EXCEPTION, throwable, false));
        let runtime_exception =
            class_graph.add_class(ClassData::new(BinaryName::RUNTIMEEXCEPTION, exception, false));
        let io_exception =
            class_graph.add_class(ClassData::new(BinaryName::IOEXCEPTION, exception, false));

        let element = vec![GenericParameter::unbounded(
            UnqualifiedName::from_string(String::from("E")).map_err(Error::InvalidArgument)?,
        )];
        let collection = class_graph.add_class(
            ClassData::new(BinaryName::COLLECTION, object, true)
                .with_generic_parameters(element.clone()),
        );
        let list = class_graph.add_class(
            ClassData::new(BinaryName::LIST, object, true).with_generic_parameters(element),
        );
        list.add_interfaces([collection]);

        let public = MethodAccessFlags::PUBLIC;
        let public_abstract = MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT;
        let public_native = MethodAccessFlags::PUBLIC | MethodAccessFlags::NATIVE;

        add_method(class_graph, object, UnqualifiedName::INIT, public, "()V", None)?;
        add_method(
            class_graph,
            object,
            UnqualifiedName::EQUALS,
            public,
            "(Ljava/lang/Object;)Z",
            None,
        )?;
        add_method(class_graph, object, UnqualifiedName::HASHCODE, public_native, "()I", None)?;
        add_method(
            class_graph,
            object,
            UnqualifiedName::TOSTRING,
            public,
            "()Ljava/lang/String;",
            None,
        )?;
        add_method(
            class_graph,
            object,
            UnqualifiedName::CLONE,
            MethodAccessFlags::PROTECTED | MethodAccessFlags::NATIVE,
            "()Ljava/lang/Object;",
            Some("()Ljava/lang/Object;^Ljava/lang/CloneNotSupportedException;"),
        )?;

        add_method(class_graph, string, UnqualifiedName::INIT, public, "()V", None)?;
        add_method(
            class_graph,
            string,
            UnqualifiedName::TOSTRING,
            public,
            "()Ljava/lang/String;",
            None,
        )?;

        add_method(class_graph, throwable, UnqualifiedName::INIT, public, "()V", None)?;
        add_method(
            class_graph,
            throwable,
            UnqualifiedName::INIT,
            public,
            "(Ljava/lang/String;)V",
            None,
        )?;
        add_method(
            class_graph,
            throwable,
            UnqualifiedName::GETMESSAGE,
            public,
            "()Ljava/lang/String;",
            None,
        )?;

        add_method(class_graph, collection, UnqualifiedName::SIZE, public_abstract, "()I", None)?;
        add_method(
            class_graph,
            list,
            UnqualifiedName::GET,
            public_abstract,
            "(I)Ljava/lang/Object;",
            Some("(I)TE;"),
        )?;

        Ok(JavaLibrary {
            lang: LangClasses {
                object,
                cloneable,
                string,
                number,
                integer,
                throwable,
                error,
                exception,
                runtime_exception,
            },
            io: IoClasses {
                serializable,
                io_exception,
            },
            util: UtilClasses { collection, list },
        })
    }
}

fn add_method<'g>(
    class_graph: &ClassGraph<'g>,
    class: &'g ClassData<'g>,
    name: UnqualifiedName,
    access_flags: MethodAccessFlags,
    descriptor: &str,
    signature: Option<&str>,
) -> Result<&'g MethodDefinition, Error> {
    let method = match signature {
        None => MethodDefinition::new(
            class.as_type(),
            name,
            access_flags,
            MethodSignature::parse_descriptor(descriptor)?,
        ),
        Some(signature) => MethodDefinition::from_class_file(
            class.as_type(),
            &class.generic_parameters,
            name.as_str(),
            access_flags,
            descriptor,
            Some(signature),
            vec![],
        )?,
    };
    class_graph.add_method(class, method)
}
