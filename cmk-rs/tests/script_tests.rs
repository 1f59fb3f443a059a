//! End-to-end evaluation of whole scripts through the public API.

use cmk::config::{CacheEntry, InitialCache, Platform};
use cmk::host::{FsHost, MemoryHost};
use cmk::project::{LibraryType, TargetKind, Visibility};
use cmk::script::stmt::parse_script;
use cmk::script::value::dequote;
use cmk::{ErrorKind, Interpreter};

fn linux(host: MemoryHost) -> Interpreter {
    Interpreter::with_host(host)
        .with_platform(Platform::Linux)
        .with_env(Vec::<(String, String)>::new())
}

fn run(src: &str) -> Interpreter {
    let mut i = linux(MemoryHost::new());
    i.run_str(src).unwrap_or_else(|e| panic!("{e}"));
    i
}

// ── Reading and substitution ──────────────────────────────────────────────────

#[test]
fn statement_shape_and_dequoting() {
    let stmts = parse_script("set(X \"a b\" c)");
    assert_eq!(stmts.len(), 1);
    assert_eq!(stmts[0].name, "set");
    assert_eq!(stmts[0].arguments, vec!["X", "\"a b\"", "c"]);
    assert_eq!(dequote(&stmts[0].arguments[1]), "a b");
}

#[test]
fn substitution_of_present_and_absent_variables() {
    let i = run("set(FOO bar)\nset(A pre_${FOO}_post)\nset(B pre_${MISSING}_post)");
    assert_eq!(i.var("A").as_deref(), Some("pre_bar_post"));
    assert_eq!(i.var("B").as_deref(), Some("pre__post"));
}

#[test]
fn nested_references_resolve_inside_out() {
    let i = run("set(WHICH FOO)\nset(FOO_VALUE 42)\nset(R ${${WHICH}_VALUE})");
    assert_eq!(i.var("R").as_deref(), Some("42"));
}

#[test]
fn unterminated_reference_is_a_syntax_error() {
    let e = linux(MemoryHost::new()).run_str("message(${oops)").unwrap_err();
    assert_eq!(e.kind, ErrorKind::Syntax);
    assert!(e.to_string().contains("unterminated variable reference"));
}

// ── Scoping ───────────────────────────────────────────────────────────────────

#[test]
fn procedure_scope_isolation() {
    let i = run(
        "set(X 0)\n\
         function(local)\n  set(X 1)\nendfunction()\n\
         function(promote)\n  set(X 1 PARENT_SCOPE)\nendfunction()\n\
         local()\nset(AFTER_LOCAL ${X})\n\
         promote()\nset(AFTER_PROMOTE ${X})",
    );
    assert_eq!(i.var("AFTER_LOCAL").as_deref(), Some("0"));
    assert_eq!(i.var("AFTER_PROMOTE").as_deref(), Some("1"));
}

#[test]
fn macro_bindings_persist_procedure_bindings_do_not() {
    let i = run(
        "macro(m arg)\n  set(FROM_M ${arg})\nendmacro()\n\
         function(f arg)\n  set(FROM_F ${arg})\nendfunction()\n\
         m(one)\nf(two)",
    );
    assert_eq!(i.var("FROM_M").as_deref(), Some("one"));
    assert_eq!(i.var("arg").as_deref(), Some("one"));
    assert_eq!(i.var("FROM_F"), None);
}

#[test]
fn parent_scope_through_nested_procedures() {
    let i = run(
        "function(_get_component_with_prefix COMPONENT PREFIX)\n\
           set(OUT_COMPONENT \"${COMPONENT}${PREFIX}\" PARENT_SCOPE)\n\
         endfunction()\n\
         function(_set_component COMPONENT)\n\
           set(${COMPONENT}_SET TRUE PARENT_SCOPE)\n\
           _get_component_with_prefix(${COMPONENT} .lib)\n\
           message(STATUS \"OUT_COMPONENT: ${OUT_COMPONENT}\")\n\
         endfunction()\n\
         _set_component(dz::function)",
    );
    assert_eq!(i.output, vec!["-- OUT_COMPONENT: dz::function.lib"]);
    assert_eq!(i.var("dz::function_SET").as_deref(), Some("TRUE"));
    assert_eq!(i.var("OUT_COMPONENT"), None);
}

// ── Conditions ────────────────────────────────────────────────────────────────

#[test]
fn defined_and_left_to_right_logic() {
    let i = run(
        "if(DEFINED X)\n  set(BEFORE yes)\nelse()\n  set(BEFORE no)\nendif()\n\
         set(X \"\")\n\
         if(DEFINED X)\n  set(AFTER yes)\nendif()\n\
         if(TRUE OR FALSE AND FALSE)\n  set(FOLD and_won)\nelse()\n  set(FOLD left_to_right)\nendif()\n\
         if(NOT FALSE AND TRUE)\n  set(NOTFOLD yes)\nendif()",
    );
    assert_eq!(i.var("BEFORE").as_deref(), Some("no"));
    assert_eq!(i.var("AFTER").as_deref(), Some("yes"));
    assert_eq!(i.var("FOLD").as_deref(), Some("left_to_right"));
    assert_eq!(i.var("NOTFOLD").as_deref(), Some("yes"));
}

#[test]
fn only_empty_false_and_off_are_false() {
    for (value, expected) in [
        ("0", "yes"),
        ("NO", "yes"),
        ("N", "yes"),
        ("IGNORE", "yes"),
        ("pkg-NOTFOUND", "yes"),
        ("\"\"", "no"),
        ("Off", "no"),
        ("false", "no"),
    ] {
        let i = run(&format!("set(X {value})\nif(X)\n  set(R yes)\nelse()\n  set(R no)\nendif()"));
        assert_eq!(i.var("R").as_deref(), Some(expected), "X = {value}");
    }
}

#[test]
fn equal_compares_text() {
    let i = run(
        "if(\"010\" EQUAL \"10\")\n  set(R eq)\nelse()\n  set(R ne)\nendif()\n\
         set(V 7)\nif(V EQUAL 7)\n  set(S eq)\nendif()",
    );
    assert_eq!(i.var("R").as_deref(), Some("ne"));
    assert_eq!(i.var("S").as_deref(), Some("eq"));
}

#[test]
fn platform_switch() {
    let src = "if(\"${CMAKE_SYSTEM_NAME}\" STREQUAL \"Windows\")\n\
                 message(STATUS \"Determined Host Windows\")\n\
               elseif(\"${CMAKE_SYSTEM_NAME}\" STREQUAL \"Linux\")\n\
                 message(STATUS \"Determined Host Linux\")\n\
               elseif(\"${CMAKE_SYSTEM_NAME}\" STREQUAL \"Darwin\")\n\
                 message(STATUS \"Determined Host Darwin\")\n\
               endif()";
    for (platform, expected) in [
        (Platform::Linux, "-- Determined Host Linux"),
        (Platform::Windows, "-- Determined Host Windows"),
        (Platform::MacOs, "-- Determined Host Darwin"),
    ] {
        let mut i = Interpreter::with_host(MemoryHost::new()).with_platform(platform);
        i.run_str(src).unwrap();
        assert_eq!(i.output, vec![expected]);
    }
}

// ── Iteration ─────────────────────────────────────────────────────────────────

const RUNFOREACH: &str = r#"
function(runforeach STEP)
    message("Running runforeach with STEP=${STEP}")

    set(Mega "4;8;12;18")
    foreach(u Mega)
        IF(NOT WIN32)
            message(STATUS "u&i&u: ${u}")
        else()
            message(STATUS "i: ${u}")
        endif()
    endforeach()

    message("foreach(I RANGE ${STEP}) ")
    foreach(I RANGE ${STEP})
        IF(WIN32)
            message(STATUS "IW: ${I}")
        ELSE()
            message(STATUS "IL: ${I}")
        Endif()
    endforeach()

    message("foreach(I RANGE 1 11 ${STEP}) ")
    foreach(I RANGE 1 11 ${STEP})
        message(STATUS "I: ${I}")
    endforeach()

    set(A 0;1)
    set(B 2 ${STEP})
#[===[
    set(D "9):")
    message(WARNING Same Thing)]===]

    message("foreach(X IN LISTS A B) ")
    foreach(X IN LISTS A B)
        message(STATUS "X=${X}")
    endforeach()

endfunction()

runforeach(4)
runforeach(3)
"#;

#[test]
fn runforeach_script() {
    let i = run(RUNFOREACH);
    let expected = vec![
        "Running runforeach with STEP=4",
        "-- u&i&u: Mega",
        "foreach(I RANGE 4) ",
        "-- IL: 0",
        "-- IL: 1",
        "-- IL: 2",
        "-- IL: 3",
        "-- IL: 4",
        "foreach(I RANGE 1 11 4) ",
        "-- I: 1",
        "-- I: 5",
        "-- I: 9",
        "foreach(X IN LISTS A B) ",
        "-- X=0",
        "-- X=1",
        "-- X=2",
        "-- X=4",
        "Running runforeach with STEP=3",
        "-- u&i&u: Mega",
        "foreach(I RANGE 3) ",
        "-- IL: 0",
        "-- IL: 1",
        "-- IL: 2",
        "-- IL: 3",
        "foreach(I RANGE 1 11 3) ",
        "-- I: 1",
        "-- I: 4",
        "-- I: 7",
        "-- I: 10",
        "foreach(X IN LISTS A B) ",
        "-- X=0",
        "-- X=1",
        "-- X=2",
        "-- X=3",
    ];
    assert_eq!(i.output, expected);
    assert!(i.diagnostics.is_empty());
    assert_eq!(i.var("D"), None);
}

#[test]
fn runforeach_on_windows_takes_other_branches() {
    let mut i = Interpreter::with_host(MemoryHost::new()).with_platform(Platform::Windows);
    i.run_str(RUNFOREACH).unwrap();
    assert!(i.output.contains(&"-- i: Mega".to_string()));
    assert!(i.output.contains(&"-- IW: 4".to_string()));
    assert!(!i.output.iter().any(|l| l.starts_with("-- IL:")));
}

#[test]
fn mismatched_terminator_is_structural() {
    let e = linux(MemoryHost::new())
        .run_str("function(f)\n  foreach(x a)\n  endfunction()\nendforeach()")
        .unwrap_err();
    assert_eq!(e.kind, ErrorKind::Structural);
}

// ── Project description ───────────────────────────────────────────────────────

#[test]
fn project_description_is_recorded() {
    let i = run(
        "cmake_minimum_required(VERSION 3.16)\n\
         project(test-project VERSION 3.2.1.0 DESCRIPTION \"A test project\" \
           HOMEPAGE_URL \"https://example.org\" LANGUAGES C CXX)\n\
         option(WITH_TOOLS \"Build tools\" ON)\n\
         add_library(test STATIC test.cpp)\n\
         add_library(test::test ALIAS test)\n\
         target_include_directories(test PRIVATE include)\n\
         target_link_libraries(test PRIVATE DirectZ)\n\
         if(WITH_TOOLS)\n  add_executable(tool tool.cpp)\n  target_link_libraries(tool test::test)\nendif()\n\
         mark_as_advanced(WITH_TOOLS)",
    );
    assert_eq!(i.var("PROJECT_VERSION_TWEAK").as_deref(), Some("0"));
    assert_eq!(i.var("test-project_VERSION_MAJOR").as_deref(), Some("3"));
    let p = i.project();
    assert_eq!(p.name.as_deref(), Some("test-project"));
    assert_eq!(p.homepage.as_deref(), Some("https://example.org"));
    let test = p.target("test").unwrap();
    assert_eq!(test.kind, TargetKind::Library(LibraryType::Static));
    assert_eq!(test.include_dirs, vec![(Visibility::Private, "include".to_string())]);
    assert_eq!(p.target("tool").unwrap().link_libraries, vec![(Visibility::Public, "test::test".to_string())]);

    let summary = p.to_string();
    assert!(summary.starts_with("Project: test-project 3.2.1.0\n"));
    assert!(summary.contains("  test (STATIC library)\n"));
    assert!(summary.contains("Advanced: WITH_TOOLS\n"));
}

#[test]
fn initial_cache_feeds_options() {
    let (cache, errors) = InitialCache::load_str("WITH_TOOLS:BOOL=OFF\n");
    assert!(errors.is_empty());
    let mut i = linux(MemoryHost::new());
    i.load_initial_cache(&cache);
    i.run_str("option(WITH_TOOLS \"Build tools\" ON)\nif(WITH_TOOLS)\n  message(tools)\nendif()")
        .unwrap();
    assert!(i.output.is_empty());
    assert_eq!(i.cache_entry("WITH_TOOLS"), Some(&CacheEntry::new("OFF", "BOOL")));
}

#[test]
fn send_error_continues_and_is_counted() {
    let i = run("message(SEND_ERROR first)\nmessage(SEND_ERROR second)\nmessage(done)");
    assert_eq!(i.send_errors(), 2);
    assert_eq!(i.output, vec!["done"]);
}

// ── Files on disk ─────────────────────────────────────────────────────────────

#[test]
fn project_tree_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("cmake")).unwrap();
    std::fs::create_dir_all(root.join("deps/lib/cmake/Dep")).unwrap();
    std::fs::write(
        root.join("CMakeLists.txt"),
        "project(Disk)\n\
         list(APPEND CMAKE_MODULE_PATH \"${CMAKE_CURRENT_LIST_DIR}/cmake\")\n\
         include(Helpers)\n\
         helper_add(core)\n\
         find_package(Dep REQUIRED)\n\
         target_link_libraries(core PUBLIC Dep::dep)\n\
         get_filename_component(PARENT ${CMAKE_CURRENT_LIST_DIR}/cmake/.. ABSOLUTE)",
    )
    .unwrap();
    std::fs::write(
        root.join("cmake/Helpers.cmake"),
        "macro(helper_add name)\n  add_library(${name} STATIC ${name}.c)\nendmacro()",
    )
    .unwrap();
    std::fs::write(
        root.join("deps/lib/cmake/Dep/DepConfig.cmake"),
        "add_library(Dep::dep INTERFACE IMPORTED)\nset(DEP_LOADED_FROM ${CMAKE_CURRENT_LIST_FILE})",
    )
    .unwrap();

    let slash = |p: &std::path::Path| p.to_string_lossy().replace('\\', "/");
    let mut i = Interpreter::with_host(FsHost).with_platform(Platform::Linux);
    i.set_cache_entry("CMAKE_PREFIX_PATH", CacheEntry::new(slash(&root.join("deps")), "PATH"));
    i.run_file(root.join("CMakeLists.txt")).unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(i.var("CMAKE_SOURCE_DIR"), Some(slash(root)));
    assert_eq!(i.var("Dep_FOUND").as_deref(), Some("TRUE"));
    assert_eq!(
        i.var("DEP_LOADED_FROM"),
        Some(slash(&root.join("deps/lib/cmake/Dep/DepConfig.cmake")))
    );
    assert_eq!(i.var("PARENT"), Some(slash(root)));
    let core = i.project().target("core").unwrap();
    assert_eq!(core.sources, vec!["core.c".to_string()]);
    assert_eq!(core.link_libraries, vec![(Visibility::Public, "Dep::dep".to_string())]);
}

#[test]
fn fatal_error_in_file_reports_location() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("CMakeLists.txt");
    std::fs::write(&file, "set(A 1)\nmessage(FATAL_ERROR \"cannot continue\")\n").unwrap();
    let mut i = Interpreter::with_host(FsHost);
    let e = i.run_file(&file).unwrap_err();
    let rendered = e.to_string();
    assert!(rendered.starts_with("CMake Error at "));
    assert!(rendered.contains("CMakeLists.txt:2 (message):"));
    assert!(rendered.ends_with("\n  cannot continue"));
}
