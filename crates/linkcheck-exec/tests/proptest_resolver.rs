//! Property tests for execution plan resolution.

use linkcheck_exec::{
    resolve, ArtifactKind, ArtifactProfile, Backend, BackendConfig, CrossRuntime, ExecutionPlan,
    SkipReason,
};
use linkcheck_targets::{Abi, Arch, Os, PlatformDescriptor};
use proptest::prelude::*;

fn platform() -> impl Strategy<Value = PlatformDescriptor> {
    (
        prop::sample::select(Arch::ALL.to_vec()),
        prop::sample::select(Os::ALL.to_vec()),
        prop::sample::select(vec![Abi::None, Abi::Gnu, Abi::Gnueabihf, Abi::Musl, Abi::Msvc]),
    )
        .prop_map(|(arch, os, abi)| PlatformDescriptor::new(arch, os, abi))
}

fn artifact() -> impl Strategy<Value = ArtifactProfile> {
    (
        prop::sample::select(vec![ArtifactKind::Executable, ArtifactKind::Library]),
        any::<bool>(),
    )
        .prop_map(|(kind, aux)| ArtifactProfile {
            kind,
            links_aux_sources: aux,
        })
}

fn backends() -> impl Strategy<Value = BackendConfig> {
    any::<[bool; 5]>().prop_map(|[qemu, wine, wasmtime, darling, rosetta]| BackendConfig {
        qemu,
        wine,
        wasmtime,
        darling,
        rosetta,
    })
}

fn runtime() -> impl Strategy<Value = CrossRuntime> {
    any::<bool>().prop_map(|set| CrossRuntime::new(set.then(|| "/opt/cross".into())))
}

proptest! {
    #[test]
    fn resolution_is_deterministic(
        host in platform(),
        target in platform(),
        art in artifact(),
        cfg in backends(),
        rt in runtime(),
    ) {
        prop_assert_eq!(
            resolve(&host, &target, art, &cfg, &rt),
            resolve(&host, &target, art, &cfg, &rt)
        );
    }

    #[test]
    fn identical_host_and_target_run_natively(
        host in platform(),
        cfg in backends(),
        rt in runtime(),
        aux in any::<bool>(),
    ) {
        let art = ArtifactProfile::executable().with_aux_sources(aux);
        prop_assert_eq!(resolve(&host, &host, art, &cfg, &rt), ExecutionPlan::Native);
    }

    #[test]
    fn all_disabled_never_emulates(
        host in platform(),
        target in platform(),
        art in artifact(),
        rt in runtime(),
    ) {
        let plan = resolve(&host, &target, art, &BackendConfig::all_disabled(), &rt);
        let emulated = matches!(plan, ExecutionPlan::Emulated { .. });
        prop_assert!(!emulated);
        if host != target {
            prop_assert!(plan.is_skip());
        }
    }

    #[test]
    fn libraries_are_never_run(
        host in platform(),
        target in platform(),
        cfg in backends(),
        rt in runtime(),
    ) {
        prop_assert_eq!(
            resolve(&host, &target, ArtifactProfile::library(), &cfg, &rt),
            ExecutionPlan::Skip(SkipReason::NotExecutable)
        );
    }

    #[test]
    fn emulated_args_start_with_invocation_name(
        host in platform(),
        target in platform(),
        art in artifact(),
        cfg in backends(),
        rt in runtime(),
    ) {
        if let ExecutionPlan::Emulated { backend, program, args } = resolve(&host, &target, art, &cfg, &rt) {
            prop_assert_eq!(&args[0], &program);
            prop_assert!(cfg.is_enabled(backend));
            if backend != Backend::Qemu {
                prop_assert!(!args.iter().any(|a| a == "-L"));
            }
        }
    }
}
