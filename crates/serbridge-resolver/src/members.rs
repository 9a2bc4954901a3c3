//! Extra member declarations contributed by configuration.

use serbridge_core::{ClassDescriptor, MemberDecl, QualifiedName};
use serbridge_registry::ClassSource;

/// Supplies member declarations beyond those carried by a descriptor.
pub trait MemberProvider {
    fn members(&self, descriptor: &ClassDescriptor) -> Vec<MemberDecl>;
}

/// Contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtraMembers;

impl MemberProvider for NoExtraMembers {
    fn members(&self, _descriptor: &ClassDescriptor) -> Vec<MemberDecl> {
        Vec::new()
    }
}

impl<F> MemberProvider for F
where
    F: Fn(&ClassDescriptor) -> Vec<MemberDecl>,
{
    fn members(&self, descriptor: &ClassDescriptor) -> Vec<MemberDecl> {
        self(descriptor)
    }
}

/// Append the provider's members to `descriptor`.
pub(crate) fn with_extra_members(
    mut descriptor: ClassDescriptor,
    provider: &dyn MemberProvider,
) -> ClassDescriptor {
    let extra = provider.members(&descriptor);
    descriptor.members.extend(extra);
    descriptor
}

/// A class source whose descriptors carry the provider's members.
pub(crate) struct ProvidedSource<'a> {
    pub(crate) source: &'a dyn ClassSource,
    pub(crate) members: &'a dyn MemberProvider,
}

impl ClassSource for ProvidedSource<'_> {
    fn find(&self, name: &QualifiedName) -> Option<ClassDescriptor> {
        self.source
            .find(name)
            .map(|descriptor| with_extra_members(descriptor, self.members))
    }

    fn descriptors(&self) -> Vec<ClassDescriptor> {
        self.source
            .descriptors()
            .into_iter()
            .map(|descriptor| with_extra_members(descriptor, self.members))
            .collect()
    }
}
