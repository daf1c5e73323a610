//! Executes one parsed command against the notes repository.
//!
//! The calling thread owns the [`MainLoop`]; each command submits its
//! repository operations and drains the loop until the callback fires.

use crate::args::{AddArgs, Command, EditArgs, ListArgs};
use anyhow::{anyhow, bail, Result};
use log::warn;
use notekeep_core::{
    completion, core_version, Folder, FolderId, MainLoop, Note, NoteDraft, NoteId, NotesRepository,
    RepoResult,
};
use std::time::Duration;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Session {
    main_loop: MainLoop,
    repo: NotesRepository,
    json: bool,
}

type Callback<T> = Box<dyn FnOnce(RepoResult<T>) + Send>;

impl Session {
    pub fn new(main_loop: MainLoop, repo: NotesRepository, json: bool) -> Self {
        Self {
            main_loop,
            repo,
            json,
        }
    }

    /// Submits one operation and blocks on the main loop for its result.
    fn call<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&NotesRepository, Callback<T>),
    {
        let (callback, done) = completion::<RepoResult<T>>();
        op(&self.repo, Box::new(callback));
        let result = done
            .wait(&self.main_loop, CALLBACK_TIMEOUT)
            .ok_or_else(|| anyhow!("no reply from the store within {CALLBACK_TIMEOUT:?}"))?;
        Ok(result?)
    }

    pub fn execute(&self, command: Command) -> Result<()> {
        match command {
            Command::List(args) => self.list(args),
            Command::Show { id } => {
                let note = self.require_note(id)?;
                self.print_note(&note)
            }
            Command::Add(args) => self.add(args),
            Command::Edit(args) => self.edit(args),
            Command::Rm { id } => self.call(|repo, cb| repo.delete_note(id, cb)),
            Command::Fav { id, state } => {
                self.require_note(id)?;
                self.call(|repo, cb| repo.set_favorite(id, state.is_on(), cb))
            }
            Command::Pin { id, state } => {
                self.require_note(id)?;
                self.call(|repo, cb| repo.set_pinned(id, state.is_on(), cb))
            }
            Command::Folders => {
                let folders: Vec<Folder> = self.call(|repo, cb| repo.list_folders(cb))?;
                self.print_folders(&folders)
            }
            Command::Mkdir { name } => {
                let id: FolderId = self.call(|repo, cb| repo.create_folder(&name, cb))?;
                println!("{id}");
                Ok(())
            }
            Command::Rmdir { id } => self.call(|repo, cb| repo.delete_folder(id, cb)),
            Command::Version => {
                println!("notekeep {}", core_version());
                Ok(())
            }
        }
    }

    fn list(&self, args: ListArgs) -> Result<()> {
        let query = args.query;
        let notes: Vec<Note> = match (args.favorites, args.folder) {
            (true, _) => self.call(|repo, cb| repo.list_favorite_notes(query.as_deref(), cb))?,
            (false, Some(folder_id)) => self.call(|repo, cb| {
                repo.list_notes_in_folder(folder_id, query.as_deref(), cb)
            })?,
            (false, None) => self.call(|repo, cb| repo.list_notes(query.as_deref(), cb))?,
        };
        self.print_notes(&notes)
    }

    fn add(&self, args: AddArgs) -> Result<()> {
        let mut draft = NoteDraft::new(args.title, args.content)
            .pinned(args.pin)
            .favorite(args.fav);
        if let Some(folder_id) = args.folder {
            draft = draft.in_folder(folder_id);
        }
        warn_if_blank("add", &draft);
        let id: NoteId = self.call(|repo, cb| repo.create_note(draft, cb))?;
        println!("{id}");
        Ok(())
    }

    fn edit(&self, args: EditArgs) -> Result<()> {
        let note = self.require_note(args.id)?;
        let mut draft = NoteDraft::from(&note);
        if let Some(title) = args.title {
            draft.title = title;
        }
        if let Some(content) = args.content {
            draft.content = content;
        }
        if args.unfile {
            draft.folder_id = None;
        } else if let Some(folder_id) = args.folder {
            draft.folder_id = Some(folder_id);
        }
        warn_if_blank("edit", &draft);
        self.call(|repo, cb| repo.update_note(args.id, draft, cb))
    }

    fn require_note(&self, id: i64) -> Result<Note> {
        match self.call::<Option<Note>, _>(|repo, cb| repo.get_note(id, cb))? {
            Some(note) => Ok(note),
            None => bail!("note {id} not found"),
        }
    }

    fn print_notes(&self, notes: &[Note]) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(notes)?);
            return Ok(());
        }
        for note in notes {
            println!("{}", note_line(note));
        }
        Ok(())
    }

    fn print_note(&self, note: &Note) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(note)?);
            return Ok(());
        }
        println!("{}", note_line(note));
        if !note.content.is_empty() {
            println!();
            println!("{}", note.content);
        }
        Ok(())
    }

    fn print_folders(&self, folders: &[Folder]) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(folders)?);
            return Ok(());
        }
        for folder in folders {
            println!("{:>5}  {}", folder.id, folder.name);
        }
        Ok(())
    }
}

fn warn_if_blank(op: &str, draft: &NoteDraft) {
    if draft.is_blank() {
        warn!("event=note_blank module=cli op={op} status=warn");
    }
}

fn note_line(note: &Note) -> String {
    let marks = format!(
        "{}{}",
        if note.pinned { 'P' } else { ' ' },
        if note.favorite { '*' } else { ' ' }
    );
    let folder = note
        .folder_id
        .map(|id| format!(" [{id}]"))
        .unwrap_or_default();
    format!("{:>5} {marks} {}{folder}", note.id, note.title)
}
