//! Class definitions with flattened method tables
//!
//! A [`ClassDef`] bundles a constructor with a table of named methods.
//! Deriving a child copies the parent's table and lays the child's own
//! methods over it, so each definition carries its complete behaviour and
//! never consults its parent at call time. The parent's constructor is kept
//! as [`ClassDef::super_constructor`] so child constructors can chain to it
//! explicitly.
//!
//! ```
//! use nyui::class::{ClassDef, ClassSpec};
//! use serde_json::json;
//!
//! let mut parent = ClassDef::root("Parent");
//! parent.define_method("greet", |_, _| Ok(json!("p")));
//!
//! let child = parent.derive(ClassSpec::new("Child").method("greet", |_, _| Ok(json!("c"))));
//! let mut instance = child.instantiate(&[]).unwrap();
//! assert_eq!(instance.call("greet", &[]).unwrap(), json!("c"));
//! assert!(child.is_derived_from(&parent));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Errors raised while constructing instances or calling methods
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassError {
    #[error("{class} has no method '{name}'")]
    MethodNotFound { class: String, name: String },

    #[error("constructor of {class} failed: {message}")]
    Constructor { class: String, message: String },

    #[error("method '{name}' failed: {message}")]
    Method { name: String, message: String },
}

/// Constructor: initializes the fields of a fresh instance
pub type Constructor = Arc<dyn Fn(&mut Instance, &[Value]) -> Result<(), String> + Send + Sync>;

/// Method: called with the receiving instance and positional arguments
pub type Method = Arc<dyn Fn(&mut Instance, &[Value]) -> Result<Value, String> + Send + Sync>;

fn noop_constructor() -> Constructor {
    Arc::new(|_: &mut Instance, _: &[Value]| -> Result<(), String> { Ok(()) })
}

/// Child part of a derivation: optional constructor plus own methods
#[derive(Clone, Default)]
pub struct ClassSpec {
    name: String,
    constructor: Option<Constructor>,
    methods: BTreeMap<String, Method>,
}

impl ClassSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            methods: BTreeMap::new(),
        }
    }

    /// Set the child constructor
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<(), String> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Add an own method
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }
}

/// A class definition with its flattened method table
#[derive(Clone)]
pub struct ClassDef {
    name: String,
    constructor: Constructor,
    methods: BTreeMap<String, Method>,
    parent: Option<Constructor>,
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl ClassDef {
    /// A definition with no parent, no-op constructor and no methods
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: noop_constructor(),
            methods: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// This definition's own constructor
    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    /// Constructor of the definition this one was derived from
    pub fn super_constructor(&self) -> Option<&Constructor> {
        self.parent.as_ref()
    }

    /// Whether `parent`'s constructor is the recorded parent constructor
    pub fn is_derived_from(&self, parent: &ClassDef) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|p| Arc::ptr_eq(p, &parent.constructor))
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Add or replace a method on this definition only.
    ///
    /// Definitions already derived from this one keep their own tables.
    pub fn define_method<F>(&mut self, name: impl Into<String>, method: F) -> &mut Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Derive a child definition.
    ///
    /// The child's table is this table overlaid with `spec`'s methods. The
    /// child constructor is `spec`'s constructor or a no-op; it does not run
    /// this definition's constructor unless it calls [`ClassDef::call_super`].
    pub fn derive(&self, spec: ClassSpec) -> ClassDef {
        let mut methods = self.methods.clone();
        methods.extend(spec.methods);

        ClassDef {
            name: spec.name,
            constructor: spec.constructor.unwrap_or_else(noop_constructor),
            methods,
            parent: Some(self.constructor.clone()),
        }
    }

    /// Derive a child whose constructor runs this definition's constructor
    /// first, then `spec`'s constructor if any.
    pub fn derive_chained(&self, spec: ClassSpec) -> ClassDef {
        let parent = self.constructor.clone();
        let own = spec.constructor.clone();
        let chained: Constructor = Arc::new(move |instance: &mut Instance, args: &[Value]| {
            parent(instance, args)?;
            match &own {
                Some(own) => own(instance, args),
                None => Ok(()),
            }
        });

        let mut child = self.derive(spec);
        child.constructor = chained;
        child
    }

    /// Construct an instance by running this definition's constructor
    pub fn instantiate(&self, args: &[Value]) -> Result<Instance, ClassError> {
        let mut instance = Instance {
            class: Arc::new(self.clone()),
            fields: Map::new(),
            own_methods: BTreeMap::new(),
        };
        (self.constructor)(&mut instance, args).map_err(|message| ClassError::Constructor {
            class: self.name.clone(),
            message,
        })?;
        Ok(instance)
    }

    /// Derive from `spec` and instantiate the result without arguments
    pub fn create(&self, spec: ClassSpec) -> Result<Instance, ClassError> {
        self.derive(spec).instantiate(&[])
    }

    /// Run the recorded parent constructor on `instance`.
    ///
    /// Does nothing for root definitions.
    pub fn call_super(&self, instance: &mut Instance, args: &[Value]) -> Result<(), ClassError> {
        match &self.parent {
            Some(parent) => parent(instance, args).map_err(|message| ClassError::Constructor {
                class: format!("super of {}", self.name),
                message,
            }),
            None => Ok(()),
        }
    }
}

/// An object built from a [`ClassDef`]
#[derive(Clone)]
pub struct Instance {
    class: Arc<ClassDef>,
    fields: Map<String, Value>,
    own_methods: BTreeMap<String, Method>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &self.fields)
            .field("own_methods", &self.own_methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Instance {
    /// Definition the instance was built from
    pub fn class(&self) -> &ClassDef {
        &self.class
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Attach methods to this instance only, shadowing class methods
    pub fn add_methods<I, K>(&mut self, methods: I)
    where
        I: IntoIterator<Item = (K, Method)>,
        K: Into<String>,
    {
        for (name, method) in methods {
            self.own_methods.insert(name.into(), method);
        }
    }

    pub fn responds_to(&self, name: &str) -> bool {
        self.own_methods.contains_key(name) || self.class.has_method(name)
    }

    /// Call a method by name
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, ClassError> {
        let method = self
            .own_methods
            .get(name)
            .or_else(|| self.class.methods.get(name))
            .cloned()
            .ok_or_else(|| ClassError::MethodNotFound {
                class: self.class.name.clone(),
                name: name.to_string(),
            })?;

        method(self, args).map_err(|message| ClassError::Method {
            name: name.to_string(),
            message,
        })
    }
}
