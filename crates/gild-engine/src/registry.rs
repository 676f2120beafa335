//! Member registry
//!
//! Reflects a [`TypeDef`] once into an immutable index of its declared
//! members: field-backed properties, methods grouped by name with their
//! overloads in declaration order, and the injection points designated by
//! markers. Entries are shared via `Arc` by every instance of the type
//! and never mutated after construction; the per-type build cache lives
//! on the [`Decorator`](crate::decorate::Decorator).

use std::fmt;

use rustc_hash::FxHashMap;

use gild_core::{LookupKey, ParamType, RegistrationError, ReturnType, Value};

use crate::decorate::DecorateOptions;
use crate::typedef::{ConstructorBody, Marker, MethodBody, TypeDef};

/// A declared field-backed property
#[derive(Debug, Clone)]
pub struct PropertySlot {
    /// Property name
    pub name: String,
    /// Declared value type
    pub ty: ParamType,
    /// Initial value, if declared
    pub initial: Option<Value>,
    /// Storage index within an instance
    pub index: usize,
}

/// A declared method overload
#[derive(Clone)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// Position in the entry's method table; also declaration order
    pub ordinal: usize,
    /// Ordered parameter types
    pub params: Vec<ParamType>,
    /// Declared return type
    pub ret: ReturnType,
    /// Native implementation
    pub body: MethodBody,
    /// The injection marker designating this member, if any
    pub injection: Option<Marker>,
}

impl MethodDescriptor {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("ordinal", &self.ordinal)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .field("injection", &self.injection)
            .finish()
    }
}

/// The paired setter of an injection point
#[derive(Debug, Clone)]
pub struct SetterDescriptor {
    /// Ordinal of the setter method
    pub ordinal: usize,
    /// The setter's single parameter type
    pub param: ParamType,
}

/// A member whose value is supplied by the lookup service
///
/// Identified at registry-build time; resolved at most once per instance.
#[derive(Debug, Clone)]
pub struct InjectionPoint {
    /// Point name (the getter's method name)
    pub name: String,
    /// Index of this point's slot in an instance's slot table
    pub slot: usize,
    /// Key under which the point resolves
    pub key: LookupKey,
    /// Ordinal of the getter method
    pub getter: usize,
    /// Paired setter, if declared
    pub setter: Option<SetterDescriptor>,
}

impl InjectionPoint {
    /// Check whether explicit assignment is legal for this point
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }
}

/// Immutable member index for one base type
pub struct RegistryEntry {
    type_id: u64,
    type_name: String,
    extensible: bool,
    properties: Vec<PropertySlot>,
    property_index: FxHashMap<String, usize>,
    methods: Vec<MethodDescriptor>,
    method_index: FxHashMap<String, Vec<usize>>,
    injection_points: Vec<InjectionPoint>,
    injection_index: FxHashMap<String, usize>,
    constructor: Option<ConstructorBody>,
}

impl RegistryEntry {
    /// Reflect a type definition into a registry entry
    ///
    /// Fails if the type declares conflicting injection markers on one
    /// member, marks a member that is not a zero-argument getter (or its
    /// paired setter), pairs a setter whose parameter cannot accept the
    /// getter's type, or declares two overloads with identical parameter
    /// lists.
    pub fn build(def: &TypeDef, options: &DecorateOptions) -> Result<Self, RegistrationError> {
        let type_name = def.name().to_string();
        let extensible = !def
            .markers()
            .iter()
            .any(|m| options.is_non_extensible_marker(&m.name));

        let mut properties = Vec::with_capacity(def.properties().len());
        let mut property_index = FxHashMap::default();
        for (index, p) in def.properties().iter().enumerate() {
            property_index.insert(p.name.clone(), index);
            properties.push(PropertySlot {
                name: p.name.clone(),
                ty: p.ty.clone(),
                initial: p.initial.clone(),
                index,
            });
        }

        let mut methods: Vec<MethodDescriptor> = Vec::with_capacity(def.methods().len());
        let mut method_index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (ordinal, m) in def.methods().iter().enumerate() {
            let mut injection: Option<&Marker> = None;
            for marker in &m.markers {
                if !options.is_injection_marker(&marker.name) {
                    continue;
                }
                match injection {
                    Some(prev) if prev.name != marker.name => {
                        return Err(RegistrationError::ConflictingInjectionMarkers {
                            type_name,
                            member: m.name.clone(),
                            first: prev.name.clone(),
                            second: marker.name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => injection = Some(marker),
                }
            }
            let injection = injection.cloned();

            if let Some(ordinals) = method_index.get(&m.name) {
                for &prev in ordinals {
                    if methods[prev].params == m.params {
                        return Err(RegistrationError::DuplicateOverload {
                            type_name,
                            member: m.name.clone(),
                            params: render_params(&m.params),
                        });
                    }
                }
            }

            method_index.entry(m.name.clone()).or_default().push(ordinal);
            methods.push(MethodDescriptor {
                name: m.name.clone(),
                ordinal,
                params: m.params.clone(),
                ret: m.ret.clone(),
                body: m.body.clone(),
                injection,
            });
        }

        let mut injection_points: Vec<InjectionPoint> = Vec::new();
        let mut injection_index = FxHashMap::default();
        for getter_ordinal in 0..methods.len() {
            let desc = &methods[getter_ordinal];
            let Some(marker) = desc.injection.clone() else {
                continue;
            };

            match desc.params.len() {
                0 => {
                    let Some(ret_ty) = desc.ret.value_type() else {
                        return Err(RegistrationError::InjectableNotGetter {
                            type_name,
                            member: desc.name.clone(),
                        });
                    };

                    let mut setter = None;
                    for &ord in &method_index[&desc.name] {
                        let cand = &methods[ord];
                        if cand.params.len() != 1 {
                            continue;
                        }
                        if !param_accepts(&cand.params[0], ret_ty) {
                            return Err(RegistrationError::SetterTypeMismatch {
                                type_name,
                                member: desc.name.clone(),
                                getter: ret_ty.to_string(),
                                setter: cand.params[0].to_string(),
                            });
                        }
                        setter = Some(SetterDescriptor {
                            ordinal: ord,
                            param: cand.params[0].clone(),
                        });
                        break;
                    }

                    let key = match &marker.key {
                        Some(key) => LookupKey::new(key.clone()),
                        None => LookupKey::new(ret_ty.to_string()),
                    };
                    let slot = injection_points.len();
                    injection_index.insert(desc.name.clone(), slot);
                    injection_points.push(InjectionPoint {
                        name: desc.name.clone(),
                        slot,
                        key,
                        getter: getter_ordinal,
                        setter,
                    });
                }
                1 => {
                    // A marked setter only names the point its getter declares
                    let has_marked_getter = method_index[&desc.name].iter().any(|&ord| {
                        let c = &methods[ord];
                        c.params.is_empty() && c.injection.is_some()
                    });
                    if !has_marked_getter {
                        return Err(RegistrationError::InjectableNotGetter {
                            type_name,
                            member: desc.name.clone(),
                        });
                    }
                }
                _ => {
                    return Err(RegistrationError::InjectableNotGetter {
                        type_name,
                        member: desc.name.clone(),
                    });
                }
            }
        }

        Ok(Self {
            type_id: def.id(),
            type_name,
            extensible,
            properties,
            property_index,
            methods,
            method_index,
            injection_points,
            injection_index,
            constructor: def.constructor().cloned(),
        })
    }

    /// Id of the reflected type
    pub fn type_id(&self) -> u64 {
        self.type_id
    }

    /// Name of the reflected type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Whether instances carry an extension bag
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Declared properties, in declaration order
    pub fn properties(&self) -> &[PropertySlot] {
        &self.properties
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&PropertySlot> {
        self.property_index.get(name).map(|&i| &self.properties[i])
    }

    /// Check if a property is declared
    pub fn has_property(&self, name: &str) -> bool {
        self.property_index.contains_key(name)
    }

    /// A method by ordinal
    pub fn method(&self, ordinal: usize) -> &MethodDescriptor {
        &self.methods[ordinal]
    }

    /// Ordinals of a name's overloads, in declaration order
    pub fn method_ordinals(&self, name: &str) -> Option<&[usize]> {
        self.method_index.get(name).map(Vec::as_slice)
    }

    /// Check if a method is declared
    pub fn has_method(&self, name: &str) -> bool {
        self.method_index.contains_key(name)
    }

    /// Number of overloads declared under a name
    pub fn overload_count(&self, name: &str) -> usize {
        self.method_index.get(name).map_or(0, Vec::len)
    }

    /// Declared method names
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.method_index.keys().map(String::as_str)
    }

    /// Declared injection points, in slot order
    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.injection_points
    }

    /// Look up an injection point by name
    pub fn injection_point(&self, name: &str) -> Option<&InjectionPoint> {
        self.injection_index
            .get(name)
            .map(|&i| &self.injection_points[i])
    }

    /// Constructor body, if declared
    pub fn constructor(&self) -> Option<&ConstructorBody> {
        self.constructor.as_ref()
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("type_id", &self.type_id)
            .field("type_name", &self.type_name)
            .field("extensible", &self.extensible)
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .field("injection_points", &self.injection_points.len())
            .finish()
    }
}

/// Check whether a setter parameter can accept the getter's declared type
fn param_accepts(setter: &ParamType, getter: &ParamType) -> bool {
    setter == getter
        || *setter == ParamType::Any
        || (*setter == ParamType::Number && *getter == ParamType::Int)
}

fn render_params(params: &[ParamType]) -> String {
    let mut out = String::new();
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&p.to_string());
    }
    out
}
