//! Catalog service: the write paths behind the book, author and user mutations.
//!
//! `add_book` writes the book and its author in one transaction and only
//! publishes to the event bus after the commit succeeded.

use tracing::{debug, info};

use crate::db::{
    AuthorRecord, BookRecord, CreateBook, CreateUser, Database, DbError, UserRecord, Validate,
    authors, books,
};
use crate::services::events::{LibraryEvent, LibraryEvents};

/// Input for [CatalogService::add_book]
#[derive(Debug, Clone)]
pub struct AddBookInput {
    pub title: String,
    pub author: String,
    pub published: i32,
    pub genres: Vec<String>,
}

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
    events: LibraryEvents,
}

impl CatalogService {
    pub fn new(db: Database, events: LibraryEvents) -> Self {
        Self { db, events }
    }

    /// Add a book, creating its author on first use.
    ///
    /// Both records are validated before either is written; any failure
    /// rolls back the whole transaction.
    pub async fn add_book(
        &self,
        input: AddBookInput,
    ) -> Result<(BookRecord, AuthorRecord), DbError> {
        let mut tx = self.db.begin().await?;

        let existing = authors::find_by_name(&mut tx, &input.author).await?;
        let is_new_author = existing.is_none();
        let mut author = existing.unwrap_or_else(|| AuthorRecord::new(input.author.clone()));

        let book = BookRecord::new(
            CreateBook {
                title: input.title,
                published: input.published,
                genres: input.genres,
            },
            &author.id,
        );
        author.book_ids.push(book.id.clone());

        let book_check = book.validate();
        let author_check = author.validate();
        book_check?;
        author_check?;

        books::insert(&mut tx, &book).await?;
        if is_new_author {
            authors::insert(&mut tx, &author).await?;
        } else {
            authors::update(&mut tx, &author).await?;
        }
        tx.commit().await?;

        info!(
            book_id = %book.id,
            author_id = %author.id,
            new_author = is_new_author,
            "Book added"
        );

        let delivered = self.events.publish(LibraryEvent::BookAdded {
            book: book.clone(),
            author: author.clone(),
        });
        debug!(book_id = %book.id, subscribers = delivered, "Published book added event");

        Ok((book, author))
    }

    /// Set an author's birth year. Returns `None` when no author has `name`.
    pub async fn edit_author(
        &self,
        name: &str,
        born: i32,
    ) -> Result<Option<AuthorRecord>, DbError> {
        let authors = self.db.authors();
        let Some(mut author) = authors.get_by_name(name).await? else {
            return Ok(None);
        };

        author.born = Some(born);
        authors.save(&author).await?;

        info!(author_id = %author.id, born, "Author updated");
        Ok(Some(author))
    }

    /// Create a user with a unique username
    pub async fn create_user(&self, input: CreateUser) -> Result<UserRecord, DbError> {
        let user = self.db.users().create(input).await?;
        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    async fn catalog() -> (CatalogService, Database, LibraryEvents) {
        let db = Database::connect_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let events = LibraryEvents::new(8);
        (CatalogService::new(db.clone(), events.clone()), db, events)
    }

    fn input(title: &str, author: &str) -> AddBookInput {
        AddBookInput {
            title: title.to_string(),
            author: author.to_string(),
            published: 1866,
            genres: vec!["classic".to_string(), "crime".to_string()],
        }
    }

    #[tokio::test]
    async fn first_book_creates_the_author() {
        let (catalog, db, _) = catalog().await;

        let (book, author) = catalog
            .add_book(input("Crime and punishment", "Fyodor Dostoevsky"))
            .await
            .unwrap();

        assert_eq!(book.author_id, author.id);
        assert_eq!(author.book_ids, vec![book.id.clone()]);
        let stored = db.authors().get_by_id(&author.id).await.unwrap().unwrap();
        assert_eq!(stored.book_ids, vec![book.id]);
    }

    #[tokio::test]
    async fn later_books_append_to_the_existing_author() {
        let (catalog, db, _) = catalog().await;

        let (first, author) = catalog
            .add_book(input("Crime and punishment", "Fyodor Dostoevsky"))
            .await
            .unwrap();
        let (second, again) = catalog
            .add_book(input("The Brothers Karamazov", "Fyodor Dostoevsky"))
            .await
            .unwrap();

        assert_eq!(author.id, again.id);
        assert_eq!(again.book_ids, vec![first.id, second.id]);
        assert_eq!(db.authors().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn invalid_author_writes_nothing() {
        let (catalog, db, events) = catalog().await;
        let mut rx = events.subscribe().unwrap();

        let err = catalog
            .add_book(input("Crime and punishment", "Bob"))
            .await
            .unwrap_err();

        assert_matches!(err, DbError::Validation(ref v) if v.field == "name");
        assert_eq!(db.books().count().await.unwrap(), 0);
        assert_eq!(db.authors().count().await.unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn book_is_validated_before_author() {
        let (catalog, _, _) = catalog().await;

        let err = catalog.add_book(input("Dune", "Bob")).await.unwrap_err();
        assert_matches!(err, DbError::Validation(ref v) if v.field == "title");
    }

    #[tokio::test]
    async fn duplicate_title_rolls_back_the_new_author() {
        let (catalog, db, _) = catalog().await;
        catalog
            .add_book(input("Crime and punishment", "Fyodor Dostoevsky"))
            .await
            .unwrap();

        let err = catalog
            .add_book(input("Crime and punishment", "Someone Else"))
            .await
            .unwrap_err();

        assert_matches!(err, DbError::Conflict { field: "title" });
        assert!(db.authors().get_by_name("Someone Else").await.unwrap().is_none());
        assert_eq!(db.books().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn committed_books_are_published() {
        let (catalog, _, events) = catalog().await;
        let mut rx = events.subscribe().unwrap();

        let (book, _) = catalog
            .add_book(input("Crime and punishment", "Fyodor Dostoevsky"))
            .await
            .unwrap();

        let LibraryEvent::BookAdded { book: published, author } = rx.recv().await.unwrap();
        assert_eq!(published, book);
        assert_eq!(author.name, "Fyodor Dostoevsky");
    }

    async fn file_catalog(dir: &tempfile::TempDir) -> (CatalogService, Database) {
        let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
        let db = Database::connect(&url, 5).await.unwrap();
        db.migrate().await.unwrap();
        (CatalogService::new(db.clone(), LibraryEvents::new(64)), db)
    }

    async fn add_concurrently(
        catalog: &CatalogService,
        inputs: Vec<AddBookInput>,
    ) -> Vec<Result<(BookRecord, AuthorRecord), DbError>> {
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                let catalog = catalog.clone();
                tokio::spawn(async move { catalog.add_book(input).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        results
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_books_by_different_authors_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, db) = file_catalog(&dir).await;

        let inputs = (0..8)
            .map(|i| input(&format!("Collected works {}", i), &format!("Author number {}", i)))
            .collect();
        for result in add_concurrently(&catalog, inputs).await {
            result.unwrap();
        }

        assert_eq!(db.books().count().await.unwrap(), 8);
        assert_eq!(db.authors().count().await.unwrap(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_books_by_one_new_author_share_the_author() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, db) = file_catalog(&dir).await;

        let inputs = (0..8)
            .map(|i| input(&format!("Collected works {}", i), "Fyodor Dostoevsky"))
            .collect();
        for result in add_concurrently(&catalog, inputs).await {
            result.unwrap();
        }

        assert_eq!(db.authors().count().await.unwrap(), 1);
        let author = db.authors().get_by_name("Fyodor Dostoevsky").await.unwrap().unwrap();
        assert_eq!(author.book_ids.len(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_titles_succeed_once() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, db) = file_catalog(&dir).await;

        let inputs = (0..4)
            .map(|_| input("Crime and punishment", "Fyodor Dostoevsky"))
            .collect();
        let results = add_concurrently(&catalog, inputs).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.into_iter().filter_map(Result::err) {
            assert_matches!(err, DbError::Conflict { field: "title" });
            assert!(err.is_invalid_input());
        }
        assert_eq!(db.books().count().await.unwrap(), 1);
        let author = db.authors().get_by_name("Fyodor Dostoevsky").await.unwrap().unwrap();
        assert_eq!(author.book_ids.len(), 1);
    }

    #[tokio::test]
    async fn editing_an_unknown_author_is_a_no_op() {
        let (catalog, db, _) = catalog().await;

        assert!(catalog.edit_author("Nobody Here", 1900).await.unwrap().is_none());
        assert_eq!(db.authors().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn edit_author_sets_birth_year() {
        let (catalog, db, _) = catalog().await;
        catalog
            .add_book(input("Crime and punishment", "Fyodor Dostoevsky"))
            .await
            .unwrap();

        let author = catalog
            .edit_author("Fyodor Dostoevsky", 1821)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(author.born, Some(1821));
        let stored = db.authors().get_by_name("Fyodor Dostoevsky").await.unwrap();
        assert_eq!(stored.and_then(|a| a.born), Some(1821));
    }
}
