use notekeep_core::{
    Folder, FolderId, MainLoop, Note, NoteDraft, NoteId, NotesRepository, RepoError, RepoResult,
};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

type Callback<T> = Box<dyn FnOnce(RepoResult<T>) + Send>;

fn call<T, F>(main_loop: &MainLoop, submit: F) -> RepoResult<T>
where
    T: Send + 'static,
    F: FnOnce(Callback<T>),
{
    let (callback, done) = notekeep_core::completion::<RepoResult<T>>();
    submit(Box::new(callback));
    done.wait(main_loop, WAIT).unwrap()
}

fn setup() -> (MainLoop, NotesRepository) {
    let main_loop = MainLoop::new();
    let repo = NotesRepository::in_memory(main_loop.handle()).unwrap();
    (main_loop, repo)
}

fn mkdir(main_loop: &MainLoop, repo: &NotesRepository, name: &str) -> FolderId {
    call(main_loop, |cb| repo.create_folder(name, cb)).unwrap()
}

fn get(main_loop: &MainLoop, repo: &NotesRepository, id: NoteId) -> Note {
    call::<Option<Note>, _>(main_loop, |cb| repo.get_note(id, cb))
        .unwrap()
        .unwrap()
}

fn folders(main_loop: &MainLoop, repo: &NotesRepository) -> Vec<Folder> {
    call(main_loop, |cb| repo.list_folders(cb)).unwrap()
}

#[test]
fn folders_are_listed_by_name() {
    let (main_loop, repo) = setup();
    mkdir(&main_loop, &repo, "Work");
    mkdir(&main_loop, &repo, "Archive");
    mkdir(&main_loop, &repo, "Personal");

    let names: Vec<_> = folders(&main_loop, &repo)
        .into_iter()
        .map(|folder| folder.name)
        .collect();
    assert_eq!(names, vec!["Archive", "Personal", "Work"]);
}

#[test]
fn duplicate_name_is_reported_and_only_one_row_exists() {
    let (main_loop, repo) = setup();
    let id = mkdir(&main_loop, &repo, "Work");

    let err = call::<FolderId, _>(&main_loop, |cb| repo.create_folder("Work", cb)).unwrap_err();
    match err {
        RepoError::DuplicateFolderName { name } => assert_eq!(name, "Work"),
        other => panic!("unexpected error: {other}"),
    }

    let listed = folders(&main_loop, &repo);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[test]
fn names_are_trimmed_before_uniqueness_check() {
    let (main_loop, repo) = setup();
    mkdir(&main_loop, &repo, "  Work ");

    assert_eq!(folders(&main_loop, &repo)[0].name, "Work");
    let err = call::<FolderId, _>(&main_loop, |cb| repo.create_folder("Work\t", cb)).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateFolderName { .. }));
}

#[test]
fn blank_name_is_invalid_input() {
    let (main_loop, repo) = setup();
    let err = call::<FolderId, _>(&main_loop, |cb| repo.create_folder("   ", cb)).unwrap_err();
    assert!(matches!(err, RepoError::InvalidInput(_)));
    assert!(folders(&main_loop, &repo).is_empty());
}

#[test]
fn deleting_a_folder_keeps_its_notes_unfiled() {
    let (main_loop, repo) = setup();
    let work = mkdir(&main_loop, &repo, "Work");
    let home = mkdir(&main_loop, &repo, "Home");

    let filed = call::<NoteId, _>(&main_loop, |cb| {
        repo.create_note(
            NoteDraft::new("Plan", "quarterly")
                .in_folder(work)
                .pinned(true)
                .favorite(true),
            cb,
        )
    })
    .unwrap();
    let elsewhere = call::<NoteId, _>(&main_loop, |cb| {
        repo.create_note(NoteDraft::new("Chores", "").in_folder(home), cb)
    })
    .unwrap();

    call::<(), _>(&main_loop, |cb| repo.delete_folder(work, cb)).unwrap();

    let remaining = folders(&main_loop, &repo);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, home);

    let note = get(&main_loop, &repo, filed);
    assert_eq!(note.title, "Plan");
    assert_eq!(note.content, "quarterly");
    assert_eq!(note.folder_id, None);
    assert!(note.pinned);
    assert!(note.favorite);

    let untouched = get(&main_loop, &repo, elsewhere);
    assert_eq!(untouched.folder_id, Some(home));
}

#[test]
fn deleting_unknown_folder_is_a_noop() {
    let (main_loop, repo) = setup();
    mkdir(&main_loop, &repo, "Work");

    call::<(), _>(&main_loop, |cb| repo.delete_folder(12345, cb)).unwrap();
    assert_eq!(folders(&main_loop, &repo).len(), 1);
}

#[test]
fn folder_listing_is_scoped_and_searchable() {
    let (main_loop, repo) = setup();
    let work = mkdir(&main_loop, &repo, "Work");

    let in_folder = call::<NoteId, _>(&main_loop, |cb| {
        repo.create_note(NoteDraft::new("Standup", "shopping for snacks").in_folder(work), cb)
    })
    .unwrap();
    call::<NoteId, _>(&main_loop, |cb| {
        repo.create_note(NoteDraft::new("Standup", "unfiled copy"), cb)
    })
    .unwrap();
    call::<NoteId, _>(&main_loop, |cb| {
        repo.create_note(NoteDraft::new("Review", "").in_folder(work), cb)
    })
    .unwrap();

    let scoped =
        call::<Vec<Note>, _>(&main_loop, |cb| repo.list_notes_in_folder(work, None, cb)).unwrap();
    assert_eq!(scoped.len(), 2);
    assert!(scoped.iter().all(|note| note.folder_id == Some(work)));

    let searched = call::<Vec<Note>, _>(&main_loop, |cb| {
        repo.list_notes_in_folder(work, Some("standup"), cb)
    })
    .unwrap();
    assert_eq!(
        searched.iter().map(|note| note.id).collect::<Vec<_>>(),
        vec![in_folder]
    );
}

#[test]
fn folder_name_can_be_reused_after_delete() {
    let (main_loop, repo) = setup();
    let first = mkdir(&main_loop, &repo, "Work");
    call::<(), _>(&main_loop, |cb| repo.delete_folder(first, cb)).unwrap();

    let second = mkdir(&main_loop, &repo, "Work");
    assert_ne!(first, second);
}
