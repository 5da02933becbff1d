use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use weft_classfile::{opcodes, ACC_PRIVATE};
use weft_core::ClassName;
use weft_mappings::{Direction, MappingService, MappingTable, MappingVersion};

use crate::declaration::{DeclarationKind, MixinDeclaration};
use crate::kind::{ReferenceKind, CONSTRUCTOR, STATIC_INITIALIZER};
use crate::mapping::{map_class, map_reference, map_syntax_match, map_target};
use crate::model::{ancestors, ClassModel, ClassModelProvider, MethodModel};
use crate::navigator::{SourceNavigator, SyntaxMatch};
use crate::scanner::{BytecodeScanner, Mode, ResolvedTarget};
use crate::selector::{MemberKey, MemberReference, ParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// See [`BytecodeScanner::optimistic_strings`].
    pub optimistic_string_completion: bool,
    pub navigate_source: bool,
    pub max_candidates: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            optimistic_string_completion: true,
            navigate_source: true,
            max_candidates: 500,
        }
    }
}

/// A narrowing predicate on usages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Ordinal(usize),
    Opcode(u8),
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Ordinal(n) => write!(f, "ordinal={n}"),
            Filter::Opcode(op) => match opcodes::name(*op) {
                Some(name) => write!(f, "opcode={name}"),
                None => write!(f, "opcode={op:#04x}"),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No class model for the target class.
    MissingClass,
    /// None of the injector's target methods exist in the class.
    NoTargetMethod,
    NoMatch,
    /// More than one distinct member matched.
    Ambiguous,
}

/// Why one target class did not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassFailure {
    pub class: ClassName,
    pub kind: FailureKind,
    /// The filter that eliminated otherwise matching usages.
    pub filter: Option<Filter>,
}

impl ClassFailure {
    fn new(class: ClassName, kind: FailureKind) -> Self {
        Self {
            class,
            kind,
            filter: None,
        }
    }

    /// Higher is more specific.
    fn rank(&self) -> u8 {
        match (self.kind, self.filter) {
            (FailureKind::Ambiguous, _) => 4,
            (_, Some(_)) => 3,
            (FailureKind::NoMatch, None) => 2,
            (FailureKind::NoTargetMethod, None) => 1,
            (FailureKind::MissingClass, None) => 0,
        }
    }
}

impl fmt::Display for ClassFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.kind {
            FailureKind::MissingClass => "class not found",
            FailureKind::NoTargetMethod => "no target method",
            FailureKind::NoMatch => "no match",
            FailureKind::Ambiguous => "ambiguous",
        };
        match self.filter {
            Some(filter) => write!(f, "{}: {reason} after {filter}", self.class),
            None => write!(f, "{}: {reason}", self.class),
        }
    }
}

/// The failure carrying the most information, by precedence
/// ambiguous > filtered > no match > no target method > missing class.
pub fn most_specific(failures: &[ClassFailure]) -> Option<&ClassFailure> {
    failures
        .iter()
        .enumerate()
        .max_by_key(|(idx, failure)| (failure.rank(), std::cmp::Reverse(*idx)))
        .map(|(_, failure)| failure)
}

/// A display-ready candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Candidate {
    pub owner: ClassName,
    pub name: String,
    pub descriptor: String,
    /// What a user would write to select this candidate.
    pub label: String,
}

impl Candidate {
    fn from_target(kind: &ReferenceKind, target: &ResolvedTarget) -> Self {
        let owner = match kind {
            ReferenceKind::Member(_) => target.declaring_class.clone(),
            _ => target.qualifier.clone(),
        };
        let usage = MemberKey::new(owner.clone(), target.name.clone(), target.descriptor.clone());
        let label = match kind {
            ReferenceKind::Member(_) if usage.is_method() => format!("{}{}", usage.name, usage.descriptor),
            ReferenceKind::Member(_) => format!("{}:{}", usage.name, usage.descriptor),
            ReferenceKind::Invoke(_) | ReferenceKind::InvokeAssign(_) | ReferenceKind::Field(_) => {
                usage.to_string()
            }
            ReferenceKind::New(_) => match usage.descriptor.strip_suffix('V') {
                Some(params) => format!("{params}{}", owner.descriptor()),
                None => usage.to_string(),
            },
            ReferenceKind::InvokeString { .. } => target
                .site
                .as_ref()
                .and_then(|site| site.ldc.clone())
                .unwrap_or_else(|| usage.to_string()),
        };
        Self {
            owner,
            name: usage.name,
            descriptor: usage.descriptor,
            label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NoTargetClasses,
    Ambiguous {
        candidates: Vec<Candidate>,
        failures: Vec<ClassFailure>,
    },
    NotFound {
        failures: Vec<ClassFailure>,
        /// The most specific responsible filter across classes.
        blame: Option<Filter>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved {
        targets: Vec<ResolvedTarget>,
        /// Matching source constructs, when source is available.
        navigation: Vec<SyntaxMatch>,
        /// Target classes that failed while others resolved.
        failures: Vec<ClassFailure>,
    },
    Candidates(Vec<Candidate>),
    Unresolved(FailureReason),
}

impl ResolutionOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionOutcome::Resolved { .. })
    }

    pub fn targets(&self) -> &[ResolvedTarget] {
        match self {
            ResolutionOutcome::Resolved { targets, .. } => targets,
            _ => &[],
        }
    }
}

enum ClassResult {
    Found {
        targets: Vec<ResolvedTarget>,
        navigation: Vec<SyntaxMatch>,
    },
    Failed {
        failure: ClassFailure,
        candidates: Vec<ResolvedTarget>,
    },
}

impl ClassResult {
    fn failed(class: &ClassName, kind: FailureKind) -> Self {
        ClassResult::Failed {
            failure: ClassFailure::new(class.clone(), kind),
            candidates: Vec::new(),
        }
    }
}

/// Resolves selectors against the target classes of a declaration.
///
/// Selectors and target classes are given in the human-readable naming
/// scheme; class models are looked up by compiled name. Results are reported
/// in the human-readable scheme.
pub struct Resolver<'a> {
    provider: &'a dyn ClassModelProvider,
    mappings: Arc<MappingService>,
    version: Option<MappingVersion>,
    options: ResolveOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(provider: &'a dyn ClassModelProvider, mappings: Arc<MappingService>) -> Self {
        Self {
            provider,
            mappings,
            version: None,
            options: ResolveOptions::default(),
        }
    }

    /// Active target-platform version; without one names are not mapped.
    pub fn with_version(mut self, version: Option<MappingVersion>) -> Self {
        self.version = version;
        self
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn resolve(
        &self,
        selector: &str,
        declaration: &MixinDeclaration,
        mode: Mode,
    ) -> Result<ResolutionOutcome, ParseError> {
        let kind = ReferenceKind::classify(selector, declaration)?;
        let methods = target_method_selectors(declaration)?;
        tracing::debug!(
            target = "weft.mixin",
            selector,
            declaration = %declaration.name,
            ?mode,
            targets = declaration.targets.len(),
            "resolving selector"
        );
        Ok(self.resolve_kind(&kind, &methods, declaration, mode))
    }

    pub(crate) fn resolve_kind(
        &self,
        kind: &ReferenceKind,
        methods: &[MemberReference],
        declaration: &MixinDeclaration,
        mode: Mode,
    ) -> ResolutionOutcome {
        if declaration.targets.is_empty() {
            return ResolutionOutcome::Unresolved(FailureReason::NoTargetClasses);
        }

        let table = self.table();
        let results: Vec<ClassResult> = declaration
            .targets
            .iter()
            .map(|target| self.resolve_in_class(&table, kind, methods, declaration, target, mode))
            .collect();

        match mode {
            Mode::Enumerate => {
                let mut candidates = Vec::new();
                for result in &results {
                    if let ClassResult::Found { targets, .. } = result {
                        candidates.extend(targets.iter().map(|t| Candidate::from_target(kind, t)));
                    }
                }
                ResolutionOutcome::Candidates(candidates)
            }
            Mode::Exact => aggregate(kind, results),
        }
    }

    fn table(&self) -> Arc<MappingTable> {
        match &self.version {
            Some(version) => self.mappings.table(version),
            None => Arc::new(MappingTable::identity("")),
        }
    }

    fn resolve_in_class(
        &self,
        table: &MappingTable,
        kind: &ReferenceKind,
        methods: &[MemberReference],
        declaration: &MixinDeclaration,
        target: &ClassName,
        mode: Mode,
    ) -> ClassResult {
        let compiled_class = map_class(table, target, Direction::ToCompiled);
        let Some(model) = self.provider.class_model(&compiled_class) else {
            tracing::debug!(
                target = "weft.mixin",
                class = %target,
                compiled = %compiled_class,
                "no class model for target class"
            );
            return ClassResult::failed(target, FailureKind::MissingClass);
        };

        let compiled = kind.with_reference(map_reference(
            table,
            kind.reference(),
            Some(target),
            Direction::ToCompiled,
        ));

        let result = match &compiled {
            ReferenceKind::Member(reference) => {
                let fields = matches!(declaration.kind, DeclarationKind::Field);
                self.resolve_member(&model, &compiled, reference, fields, mode, target)
            }
            _ => self.resolve_usages(table, &model, &compiled, methods, declaration, mode, target),
        };

        match result {
            ClassResult::Found {
                targets,
                navigation,
            } => ClassResult::Found {
                targets: targets
                    .iter()
                    .map(|t| map_target(table, t, Direction::ToMapped))
                    .collect(),
                navigation: navigation
                    .iter()
                    .map(|m| map_syntax_match(table, m, Direction::ToMapped))
                    .collect(),
            },
            ClassResult::Failed {
                failure,
                candidates,
            } => ClassResult::Failed {
                failure,
                candidates: candidates
                    .iter()
                    .map(|t| map_target(table, t, Direction::ToMapped))
                    .collect(),
            },
        }
    }

    /// Members declared by the class or inherited from its supertypes.
    /// Overridden members are reported once, at the most derived class;
    /// supertype constructors, initializers and private members are skipped.
    fn find_members(
        &self,
        model: &ClassModel,
        reference: &MemberReference,
        fields: bool,
        mode: Mode,
    ) -> Vec<ResolvedTarget> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        let hierarchy = std::iter::once(model.name.clone()).chain(ancestors(self.provider, &model.name));
        for class in hierarchy {
            let Some(current) = self.provider.class_model(&class) else {
                continue;
            };
            let inherited = class != model.name;
            let keys: Vec<MemberKey> = if fields {
                current
                    .fields
                    .iter()
                    .filter(|f| !inherited || is_inheritable(&f.name, f.access_flags))
                    .map(|f| current.field_key(f))
                    .collect()
            } else {
                current
                    .methods
                    .iter()
                    .filter(|m| !inherited || is_inheritable(&m.name, m.access_flags))
                    .map(|m| current.method_key(m))
                    .collect()
            };
            for key in keys {
                if !seen.insert((key.name.clone(), key.descriptor.clone())) {
                    continue;
                }
                if mode == Mode::Enumerate || reference.matches_key(&key, Some(&model.name)) {
                    out.push(ResolvedTarget {
                        declaring_class: key.owner,
                        name: key.name,
                        descriptor: key.descriptor,
                        qualifier: model.name.clone(),
                        site: None,
                    });
                }
            }
        }
        out
    }

    fn resolve_member(
        &self,
        model: &ClassModel,
        kind: &ReferenceKind,
        reference: &MemberReference,
        fields: bool,
        mode: Mode,
        target: &ClassName,
    ) -> ClassResult {
        let found = self.find_members(model, reference, fields, mode);
        if mode == Mode::Enumerate {
            return ClassResult::Found {
                targets: found,
                navigation: Vec::new(),
            };
        }

        if found.is_empty() {
            return ClassResult::failed(target, FailureKind::NoMatch);
        }
        if found.len() > 1 && !kind.allows_multiple() {
            return ClassResult::Failed {
                failure: ClassFailure::new(target.clone(), FailureKind::Ambiguous),
                candidates: found,
            };
        }

        let navigation = if self.options.navigate_source {
            self.member_declarations(reference, &found)
        } else {
            Vec::new()
        };
        ClassResult::Found {
            targets: found,
            navigation,
        }
    }

    fn member_declarations(&self, reference: &MemberReference, found: &[ResolvedTarget]) -> Vec<SyntaxMatch> {
        let keys: HashSet<MemberKey> = found.iter().map(ResolvedTarget::member).collect();
        // Declaring classes may differ from the target; match by name and
        // descriptor only, then keep the resolved members.
        let unowned = ReferenceKind::Member(MemberReference {
            owner: None,
            ..reference.clone()
        });

        let mut visited = HashSet::new();
        let mut out = Vec::new();
        for class in found.iter().map(|t| &t.declaring_class) {
            if !visited.insert(class) {
                continue;
            }
            let Some(source) = self.provider.class_model(class).and_then(|m| m.source.clone()) else {
                continue;
            };
            out.extend(
                SourceNavigator::new(&unowned)
                    .visit(&source)
                    .into_iter()
                    .filter(|m| keys.contains(&m.member)),
            );
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_usages(
        &self,
        table: &MappingTable,
        model: &ClassModel,
        kind: &ReferenceKind,
        methods: &[MemberReference],
        declaration: &MixinDeclaration,
        mode: Mode,
        target: &ClassName,
    ) -> ClassResult {
        let scanned = self.target_methods(table, model, methods, target);
        if scanned.is_empty() {
            return ClassResult::failed(target, FailureKind::NoTargetMethod);
        }

        let point = declaration.injection_point();
        let ordinal = point.and_then(|p| p.ordinal);
        let opcode = point.and_then(|p| p.opcode);

        let scanner = BytecodeScanner::new(kind, mode)
            .optimistic_strings(self.options.optimistic_string_completion)
            .with_hierarchy(self.provider);

        let mut targets = Vec::new();
        let mut navigation = Vec::new();
        let mut blame = None;

        for method in scanned {
            let key = model.method_key(method);
            let Some(body) = &method.body else {
                tracing::debug!(
                    target = "weft.mixin",
                    method = %key,
                    "target method has no body; skipping"
                );
                continue;
            };

            // Ranks come from the unfiltered scan so that filtered usages can
            // still be lined up with their source constructs.
            let mut found = ranked(scanner.scan(&key, body), |t| usage_key(&t.qualifier, &t.name, &t.descriptor));
            if mode == Mode::Exact {
                if let Some(op) = opcode {
                    let before = found.len();
                    found.retain(|(_, _, t)| t.site.as_ref().is_some_and(|site| site.opcode == op));
                    if before > 0 && found.is_empty() {
                        blame.get_or_insert(Filter::Opcode(op));
                    }
                }
                if let Some(n) = ordinal {
                    let before = found.len();
                    found = found.into_iter().nth(n).into_iter().collect();
                    if before > 0 && found.is_empty() {
                        blame.get_or_insert(Filter::Ordinal(n));
                    }
                }
            }

            if mode == Mode::Exact && self.options.navigate_source && !found.is_empty() {
                navigation.extend(self.navigate(model, method, kind, &found));
            }
            targets.extend(found.into_iter().map(|(_, _, target)| target));
        }

        if mode == Mode::Exact && targets.is_empty() {
            return ClassResult::Failed {
                failure: ClassFailure {
                    class: target.clone(),
                    kind: FailureKind::NoMatch,
                    filter: blame,
                },
                candidates: Vec::new(),
            };
        }
        ClassResult::Found {
            targets,
            navigation,
        }
    }

    /// Source constructs in `method` corresponding to the compiled usages
    /// that survived filtering.
    ///
    /// The n-th source usage of a member through a qualifier is taken to be
    /// the n-th compiled usage of it.
    fn navigate(
        &self,
        model: &ClassModel,
        method: &MethodModel,
        kind: &ReferenceKind,
        found: &[Ranked<ResolvedTarget>],
    ) -> Vec<SyntaxMatch> {
        let Some(source) = &model.source else {
            return Vec::new();
        };
        let Some(source_method) = source.method(&method.name, &method.descriptor) else {
            return Vec::new();
        };
        let wanted: HashSet<(&UsageKey, usize)> = found.iter().map(|(key, rank, _)| (key, *rank)).collect();
        let matches = SourceNavigator::new(kind).visit_method(source, source_method);
        ranked(matches, |m| usage_key(&m.qualifier, &m.member.name, &m.member.descriptor))
            .into_iter()
            .filter(|(key, rank, _)| wanted.contains(&(key, *rank)))
            .map(|(_, _, found)| found)
            .collect()
    }

    /// The methods of `model` an injection point looks inside.
    fn target_methods<'m>(
        &self,
        table: &MappingTable,
        model: &'m ClassModel,
        selectors: &[MemberReference],
        target: &ClassName,
    ) -> Vec<&'m MethodModel> {
        if selectors.is_empty() {
            return model.methods.iter().filter(|m| m.body.is_some()).collect();
        }

        let mut out: Vec<&MethodModel> = Vec::new();
        for selector in selectors {
            let compiled = map_reference(table, selector, Some(target), Direction::ToCompiled);
            for method in &model.methods {
                let matched = compiled.matches(&model.name, &method.name, &method.descriptor, Some(&model.name));
                if matched && !out.iter().any(|m| std::ptr::eq(*m, method)) {
                    out.push(method);
                }
            }
        }
        out
    }
}

/// A usage as seen from the call site: qualifier, name and descriptor.
type UsageKey = (ClassName, String, String);

/// An item with its key and its position among items sharing that key.
type Ranked<T> = (UsageKey, usize, T);

fn usage_key(qualifier: &ClassName, name: &str, descriptor: &str) -> UsageKey {
    (qualifier.clone(), name.to_string(), descriptor.to_string())
}

fn ranked<T>(items: Vec<T>, key_of: impl Fn(&T) -> UsageKey) -> Vec<Ranked<T>> {
    let mut seen: HashMap<UsageKey, usize> = HashMap::new();
    items
        .into_iter()
        .map(|item| {
            let key = key_of(&item);
            let next = seen.entry(key.clone()).or_default();
            let rank = *next;
            *next += 1;
            (key, rank, item)
        })
        .collect()
}

fn is_inheritable(name: &str, access_flags: u16) -> bool {
    access_flags & ACC_PRIVATE == 0 && name != CONSTRUCTOR && name != STATIC_INITIALIZER
}

pub(crate) fn target_method_selectors(declaration: &MixinDeclaration) -> Result<Vec<MemberReference>, ParseError> {
    match declaration.injection_point() {
        Some(point) => point.methods.iter().map(|m| MemberReference::parse(m)).collect(),
        None => Ok(Vec::new()),
    }
}

fn aggregate(kind: &ReferenceKind, results: Vec<ClassResult>) -> ResolutionOutcome {
    let mut targets = Vec::new();
    let mut navigation = Vec::new();
    let mut failures = Vec::new();
    let mut ambiguous = Vec::new();

    for result in results {
        match result {
            ClassResult::Found {
                targets: found,
                navigation: nav,
            } => {
                targets.extend(found);
                navigation.extend(nav);
            }
            ClassResult::Failed {
                failure,
                candidates,
            } => {
                ambiguous.extend(candidates);
                failures.push(failure);
            }
        }
    }

    if !targets.is_empty() {
        return ResolutionOutcome::Resolved {
            targets,
            navigation,
            failures,
        };
    }

    if !ambiguous.is_empty() {
        let mut seen = HashSet::new();
        let candidates = ambiguous
            .iter()
            .map(|t| Candidate::from_target(kind, t))
            .filter(|c| seen.insert((c.owner.clone(), c.name.clone(), c.descriptor.clone())))
            .collect();
        return ResolutionOutcome::Unresolved(FailureReason::Ambiguous {
            candidates,
            failures,
        });
    }

    let blame = most_specific(&failures).and_then(|f| f.filter);
    ResolutionOutcome::Unresolved(FailureReason::NotFound { failures, blame })
}
